pub mod classification_results;
pub mod device_settings;
pub mod device_user;
pub mod devices;
pub mod roles;
pub mod sensor_readings;
pub mod users;
