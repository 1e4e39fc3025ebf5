//! Adapters that plug external services into `apirun-core`: the newman
//! command line, the collection registry, the login endpoint and S3.

pub mod auth;
pub mod factory;
pub mod newman;
pub mod registry;
pub mod storage;
