use axum::http::Request;
use std::net::{IpAddr, Ipv4Addr};
use tower_governor::{GovernorError, key_extractor::KeyExtractor};

/// IP key extractor used on the public sensor ingestion endpoint.
/// Field devices typically sit behind NAT or a reverse proxy, so the
/// forwarded header is preferred over the peer address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackIpKeyExtractor;

impl KeyExtractor for FallbackIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        if let Some(ip) = forwarded_ip(req) {
            return Ok(ip);
        }

        if let Some(connect_info) = req
            .extensions()
            .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        {
            return Ok(connect_info.0.ip());
        }

        // Requests without an identifiable IP share one bucket; this keeps
        // rate limiting functional behind Docker networking.
        Ok(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }
}

fn forwarded_ip<T>(req: &Request<T>) -> Option<IpAddr> {
    for header in ["x-forwarded-for", "x-real-ip"] {
        let candidate = req
            .headers()
            .get(header)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());
        if candidate.is_some() {
            return candidate;
        }
    }
    None
}
