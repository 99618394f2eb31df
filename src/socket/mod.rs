//! Socket handling:
//! - [`connectjob`]: DNS → TCP → TLS connection flow, honouring the route
//! - [`route`]: the process-wide network binding slot
//! - [`tls`]: TLS configuration with BoringSSL

pub mod client;
pub mod connectjob;
pub mod route;
pub mod tls;
