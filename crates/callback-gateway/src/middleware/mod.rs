//! Middleware stack for the callback gateway.
//!
//! Layer order: Request → Tracing → Timeout → Body limit → Handler

pub mod metrics;
pub mod tracing;

pub use metrics::{CallbackMetrics, RequestTimer};
pub use tracing::TracingLayer;
