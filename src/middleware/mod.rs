pub mod client_ip;
pub mod rate_limit;
pub mod timing;

pub use client_ip::{ClientIp, IpPseudonymizer};
pub use rate_limit::RateLimiter;
pub use timing::process_time;
