//! Production-friendly observability hooks for the exchange driver.
//!
//! ```rust
//! use tobserve::{MetricsExchangeHooks, SafeExchangeHooks, TracingExchangeHooks};
//!
//! let _hooks = SafeExchangeHooks::new(TracingExchangeHooks);
//! let _metrics = MetricsExchangeHooks;
//! ```

mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use metrics_hooks::MetricsExchangeHooks;
pub use safe_hooks::SafeExchangeHooks;
pub use tracing_hooks::{QUERY_PREVIEW_CHARS, TracingExchangeHooks, query_preview};

pub mod prelude {
    pub use crate::{MetricsExchangeHooks, SafeExchangeHooks, TracingExchangeHooks};
}
