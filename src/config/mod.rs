/// Database configuration and connection management
pub mod database;

/// Application settings and user/team directory from config.toml
pub mod settings;

/// Workflow definition loading from workflow.toml
pub mod workflow;
