//! Shared utilities

pub mod config;
pub mod context;
pub mod data;
pub mod diagnostic;
pub mod settings;

pub use config::Config;
pub use context::GlobalContext;
pub use diagnostic::Diagnostic;
pub use settings::Settings;
