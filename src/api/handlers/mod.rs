/// Administrative reset and audit
pub mod admin;
/// Health check
pub mod general;
/// Invoice endpoints
pub mod invoices;
/// Kitchen ticket endpoints
pub mod kots;
/// Order endpoints
pub mod orders;
