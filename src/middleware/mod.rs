/// Middleware functions related to CORS implementation
pub mod cors;
/// IP address extraction middleware
pub mod ip_address;
