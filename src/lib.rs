//! GeoSense - REST API backend for environmental IoT disaster monitoring
//!
//! This library exposes the core modules for testing and reuse.

pub mod auth;
pub mod common;
pub mod config;
pub mod entity;
pub mod error;
pub mod routes;
pub mod services;
