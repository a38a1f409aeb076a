//! Application options

use crate::deploy::reconciler::ReconcileOptions;
use crate::logs::LogLevel;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Log level
    pub log_level: LogLevel,

    /// Accept every prompt default without asking (`--yes`)
    pub assume_defaults: bool,

    /// Reconciler settings
    pub reconcile: ReconcileOptions,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            assume_defaults: false,
            reconcile: ReconcileOptions::default(),
        }
    }
}
