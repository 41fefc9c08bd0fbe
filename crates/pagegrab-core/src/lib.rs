pub mod config;
pub mod logging;

pub mod context;
pub mod formatter;
pub mod host;
pub mod model;
pub mod naming;
pub mod orchestrator;
pub mod preferences;
pub mod router;
pub mod scanner;
