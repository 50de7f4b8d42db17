pub mod auth;
pub mod client_context;
pub mod cors;
pub mod rate_limit;
pub mod security_headers;
