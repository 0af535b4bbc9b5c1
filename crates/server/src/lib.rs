//! HTTP surface for trackfetch: job submission, job inspection, the live
//! job log stream, direct URL downloads and Prometheus metrics.

pub mod api;
pub mod metrics;
pub mod state;
