//! Sequential multi-action checks with fixed-interval pacing.

use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::client::ActionClient;
use crate::config::PacingConfig;
use crate::error::ApiError;
use crate::types::{ActionKind, ActionRequest};

// ---------------------------------------------------------------------------
// Pacing
// ---------------------------------------------------------------------------

/// Fixed delay inserted after each item of a batch.
///
/// The delay only applies when the batch holds at least `min_batch_size`
/// items. It never looks at `retry_after` hints from the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pacing {
    pub interval: Duration,
    pub min_batch_size: usize,
    /// When set, no delay follows the last item.
    pub skip_trailing: bool,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            min_batch_size: 2,
            skip_trailing: false,
        }
    }
}

impl Pacing {
    pub fn none() -> Self {
        Self {
            interval: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    pub fn from_config(cfg: &PacingConfig) -> Self {
        Self {
            interval: Duration::from_millis(cfg.interval_ms),
            min_batch_size: 2,
            skip_trailing: cfg.skip_trailing,
        }
    }

    /// Delay to wait after item `index` (0-based) of a batch of `len`.
    pub fn delay_after(&self, index: usize, len: usize) -> Option<Duration> {
        if self.interval.is_zero() || len < self.min_batch_size {
            return None;
        }
        if self.skip_trailing && index + 1 == len {
            return None;
        }
        Some(self.interval)
    }
}

// ---------------------------------------------------------------------------
// ActionOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeDetail {
    Result(Value),
    Error(ApiError),
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionOutcome<K> {
    pub key: K,
    pub kind: ActionKind,
    pub success: bool,
    /// Completion flag read from the result; `None` on failure or when the
    /// result lacks the field.
    pub completed: Option<bool>,
    #[serde(flatten)]
    pub detail: OutcomeDetail,
}

impl<K> ActionOutcome<K> {
    fn from_call(key: K, kind: ActionKind, res: Result<Value, ApiError>) -> Self {
        match res {
            Ok(result) => Self {
                key,
                kind,
                success: true,
                completed: kind.completion_from(&result),
                detail: OutcomeDetail::Result(result),
            },
            Err(err) => Self {
                key,
                kind,
                success: false,
                completed: None,
                detail: OutcomeDetail::Error(err),
            },
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match &self.detail {
            OutcomeDetail::Error(e) => Some(e),
            OutcomeDetail::Result(_) => None,
        }
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.detail {
            OutcomeDetail::Result(v) => Some(v),
            OutcomeDetail::Error(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// BatchRunner
// ---------------------------------------------------------------------------

pub struct BatchRunner<'a> {
    client: &'a ActionClient,
    pacing: Pacing,
}

impl<'a> BatchRunner<'a> {
    pub fn new(client: &'a ActionClient) -> Self {
        Self {
            client,
            pacing: client.pacing().clone(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Check every item in input order, one at a time.
    ///
    /// A failing item is recorded in its outcome and the batch moves on.
    pub fn run_all<K>(&self, items: Vec<(K, ActionRequest)>) -> Vec<ActionOutcome<K>> {
        let len = items.len();
        let started = Instant::now();
        let mut outcomes = Vec::with_capacity(len);

        for (index, (key, request)) in items.into_iter().enumerate() {
            let kind = request.kind();
            let res = self.client.execute(&request);
            if let Err(e) = &res {
                warn!(
                    index,
                    kind = kind.as_str(),
                    error_kind = e.kind().as_str(),
                    error = %e,
                    "batch item failed"
                );
            }
            outcomes.push(ActionOutcome::from_call(key, kind, res));

            if let Some(delay) = self.pacing.delay_after(index, len) {
                std::thread::sleep(delay);
            }
        }

        let failed = outcomes.iter().filter(|o| !o.success).count();
        info!(
            items = len,
            failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch complete"
        );
        outcomes
    }
}
