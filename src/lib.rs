pub mod config;
pub mod error;
pub mod logging;
pub mod metric;
pub mod model;
pub mod pipeline;
pub mod projection;
pub mod raw;
pub mod snapshot;
pub mod source;
