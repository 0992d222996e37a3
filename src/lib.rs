pub mod backoff;
pub mod classify;
pub mod config;
pub mod deadline;
pub mod dedup;
pub mod extract;
pub mod fetch;
pub mod harness;
pub mod identity;
pub mod model;
pub mod pipeline;
pub mod store;
pub mod walker;
