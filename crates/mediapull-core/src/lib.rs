pub mod config;
pub mod error;
pub mod logging;

pub mod listing;
pub mod orchestrator;
pub mod paths;
pub mod pool;
pub mod progress;
pub mod record;
pub mod storage;
pub mod transport;
