//! Infrastructure components: global rate limiting, the outbound webhook
//! client, and telemetry initialization.

pub mod rate_limit;
pub mod telemetry;
pub mod webhook;

pub use rate_limit::SlidingWindowLimiter;
pub use webhook::{DiscordNotifier, Notifier, NotifyError};
