//! # Utility Modules
//!
//! Supporting utilities for logging and decoder observability.
//!
//! ## Components
//! - **Logging**: `tracing-subscriber` setup driven by `LoggingConfig`
//! - **Metrics**: per-decoder counters

pub mod logging;
pub mod metrics;

pub use metrics::DecoderStats;
