//! Application context.
//!
//! One `AppContext` is built at startup and handed to every controller and
//! fetcher that needs it. It carries the configuration, the active team, and
//! the alert queue the UI drains into its snackbar.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use viewsync_core::EngineConfig;

/// Alert severity, mirroring the UI's alert colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub message: String,
    pub severity: Severity,
}

impl Alert {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }
}

/// FIFO of alerts waiting to be shown.
#[derive(Debug, Default)]
pub struct AlertQueue {
    alerts: Mutex<Vec<Alert>>,
}

impl AlertQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an alert.
    pub fn push(&self, alert: Alert) {
        self.alerts.lock().push(alert);
    }

    /// Take every queued alert, oldest first.
    pub fn drain(&self) -> Vec<Alert> {
        std::mem::take(&mut *self.alerts.lock())
    }

    pub fn len(&self) -> usize {
        self.alerts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.lock().is_empty()
    }
}

/// Session-scoped application state, passed explicitly.
#[derive(Debug)]
pub struct AppContext {
    config: EngineConfig,
    active_team: RwLock<Option<String>>,
    alerts: AlertQueue,
}

impl AppContext {
    /// Build the context at app start.
    pub fn init(config: EngineConfig) -> Arc<Self> {
        tracing::debug!("Initializing app context: {:?}", config);
        Arc::new(Self {
            config,
            active_team: RwLock::new(None),
            alerts: AlertQueue::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Team whose collections are being browsed, if any.
    pub fn active_team(&self) -> Option<String> {
        self.active_team.read().clone()
    }

    pub fn set_active_team(&self, team_id: Option<String>) {
        tracing::debug!("Active team set to {:?}", team_id);
        *self.active_team.write() = team_id;
    }

    pub fn alerts(&self) -> &AlertQueue {
        &self.alerts
    }
}
