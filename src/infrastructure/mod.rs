pub mod throttle;

pub use throttle::{BackoffPolicy, RateLimitPermit, RateLimiter, RecordingSleeper, Sleeper, TokioSleeper};
