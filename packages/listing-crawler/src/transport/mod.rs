//! Transport implementations.

pub mod http;
pub mod rate_limited;

pub use http::HttpTransport;
pub use rate_limited::{RateLimitedTransport, TransportExt};
