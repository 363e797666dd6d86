//! Live single-bar evaluation with entry notifications.
//!
//! A `LiveEvaluator` holds one configured row. Each call to `on_candles`
//! evaluates the final candle of the history it is handed and, when an
//! entry fires, sends the entry message through its `NotificationSink`.
//! Delivery is best effort: a failing sink is logged and never changes the
//! decision returned to the caller.

use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use siglab_core::{Candle, EvalContext, MemorySink, SignalError, Strategy, StrategyState};

use crate::config::{ConfigError, SweepConfig};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Outbound channel for entry notifications (mail, chat, webhook...).
pub trait NotificationSink: Send + Sync {
    fn notify(&self, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Logs notifications at INFO under the `siglab::notify` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!(target: "siglab::notify", subject, "{body}");
        Ok(())
    }
}

/// One delivered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

/// Keeps notifications in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        match self.sent.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl NotificationSink for MemoryNotifier {
    fn notify(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let mut guard = match self.sent.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(Notification {
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

impl<T: NotificationSink + ?Sized> NotificationSink for std::sync::Arc<T> {
    fn notify(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        (**self).notify(subject, body)
    }
}

pub struct LiveEvaluator {
    strategy: Strategy,
    state: StrategyState,
    sink: Box<dyn NotificationSink>,
    /// Timestamp of the last candle an entry was notified for.
    last_notified: Option<i64>,
}

impl LiveEvaluator {
    pub fn new(
        strategy: Strategy,
        row_index: usize,
        sink: Box<dyn NotificationSink>,
    ) -> Result<Self, RunError> {
        let state = strategy.configure(row_index)?;
        info!(
            strategy = %strategy.name(),
            row_index,
            warmup = strategy.warmup_bars(&state),
            "live evaluator configured"
        );
        Ok(Self {
            strategy,
            state,
            sink,
            last_notified: None,
        })
    }

    pub fn from_config(
        config: &SweepConfig,
        row_index: usize,
        sink: Box<dyn NotificationSink>,
    ) -> Result<Self, RunError> {
        Self::new(config.build_strategy()?, row_index, sink)
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn state(&self) -> &StrategyState {
        &self.state
    }

    pub fn describe_settings(&self) -> String {
        self.strategy.describe_settings(&self.state)
    }

    /// Decide the final candle of `candles`.
    ///
    /// Re-delivering the same closed candle returns the same decision but
    /// notifies only once.
    pub fn on_candles(&mut self, candles: &[Candle]) -> Result<bool, RunError> {
        let messages = MemorySink::new();
        let fired = self
            .strategy
            .evaluate_latest(candles, &self.state, &EvalContext::new(&messages))?;

        let Some(last) = candles.last() else {
            return Ok(fired);
        };
        if !fired {
            return Ok(false);
        }
        if self.last_notified == Some(last.timestamp) {
            debug!(timestamp = last.timestamp, "entry already notified");
            return Ok(true);
        }

        let subject = match last.datetime() {
            Some(at) => format!("{} entry at {}", self.strategy.name(), at.to_rfc3339()),
            None => format!("{} entry at {}", self.strategy.name(), last.timestamp),
        };
        let body = messages.messages().join("\n");
        if let Err(e) = self.sink.notify(&subject, &body) {
            warn!(error = %e, subject = %subject, "entry notification failed");
        }
        self.last_notified = Some(last.timestamp);
        Ok(true)
    }
}
