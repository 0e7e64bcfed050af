//! Closed-loop load generation and comparison of two HTTP server runtimes.
//!
//! The [`LoadDriver`] paces requests against each target through a
//! [`LoadClient`], the [`MetricsCollector`] keeps the per-target outcome log,
//! and [`build_report`] turns the finished [`TargetResult`]s into a
//! baseline-vs-contender [`ComparisonReport`].

pub mod core;
pub mod error;
pub mod models;

pub use crate::core::http_client::{HttpClient, LoadClient};
pub use crate::core::load_driver::LoadDriver;
pub use crate::core::metrics_collector::MetricsCollector;
pub use crate::core::report::build_report;
pub use crate::error::{ClientError, ClientResult};
pub use crate::models::config::{Endpoint, LoadTestConfig, Target};
pub use crate::models::report::ComparisonReport;
pub use crate::models::result::TargetResult;
