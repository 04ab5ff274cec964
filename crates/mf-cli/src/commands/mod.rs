//! CLI command implementations

pub(crate) mod build;
pub(crate) mod common;
pub(crate) mod export;
pub(crate) mod refresh;
pub(crate) mod scan;
pub(crate) mod schema;
pub(crate) mod status;
pub(crate) mod validate;
