// ABOUTME: Configuration module root
// ABOUTME: Re-exports environment and logging configuration types

pub mod environment;
pub mod logging;

pub use environment::WorkerConfig;
pub use logging::LoggingConfig;
