pub mod rate_limit;
pub mod status;
pub mod storage;
