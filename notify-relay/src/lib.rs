//! Notify Relay Server
//!
//! HTTP relay that forwards dashboard notifications to the WhatsApp
//! messaging provider. Provides:
//! - The relay endpoint (CORS preflight + send) on the main listener
//! - Health and Prometheus metrics endpoints on a second listener
//! - Per-client rate limiting

pub mod config;
pub mod handler;
pub mod http;
pub mod metrics;
pub mod rate_limit;
