pub mod failure_log;
pub mod loader;
