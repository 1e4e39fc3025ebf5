//! Batch execution and failure aggregation for per-subject API collection runs.
//!
//! One collection plus N subjects becomes N isolated runs of an external test
//! tool and one ordered failure summary.

pub mod api;
pub mod auth;
pub mod batch;
pub mod collection;
pub mod config;
pub mod context;
pub mod error;
pub mod plan;
pub mod publish;
pub mod result;
pub mod runner;
pub mod subject;
pub mod util;
