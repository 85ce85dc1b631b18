pub mod bybit;
pub mod rate_limiter;

pub use bybit::BybitClient;
pub use rate_limiter::RateLimiter;
