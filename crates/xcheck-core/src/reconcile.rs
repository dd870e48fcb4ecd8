//! Merge verification results into persisted campaign-action state.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::batch::OutcomeDetail;
use crate::client::ActionClient;
use crate::error::ApiError;
use crate::store::{ActionKey, ActionStore};
use crate::types::{ActionKind, ActionRequest};

/// Outcomes keyed by kind, in the order the kinds were first requested.
pub type ReconcileReport = IndexMap<ActionKind, ReconcileOutcome>;

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileOutcome {
    pub kind: ActionKind,
    pub success: bool,
    pub completed: Option<bool>,
    #[serde(flatten)]
    pub detail: OutcomeDetail,
    /// Set when the check went through but the record could not be written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_error: Option<String>,
}

impl ReconcileOutcome {
    pub fn error(&self) -> Option<&ApiError> {
        match &self.detail {
            OutcomeDetail::Error(e) => Some(e),
            OutcomeDetail::Result(_) => None,
        }
    }
}

pub struct Reconciler<'a> {
    client: &'a ActionClient,
    store: &'a dyn ActionStore,
    clock: fn() -> DateTime<Utc>,
}

impl<'a> Reconciler<'a> {
    pub fn new(client: &'a ActionClient, store: &'a dyn ActionStore) -> Self {
        Self {
            client,
            store,
            clock: Utc::now,
        }
    }

    /// Replace the source of `checked_at` timestamps.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Check each required action in order and persist the ones that could
    /// be checked.
    ///
    /// Neither an API failure nor a storage failure stops the loop; both are
    /// recorded in that action's outcome. A kind listed twice keeps its first
    /// position and the later outcome.
    pub fn reconcile_actions(
        &self,
        user_id: &str,
        campaign_id: &str,
        required: &[ActionRequest],
    ) -> ReconcileReport {
        let mut outcomes = ReconcileReport::new();

        for request in required {
            let kind = request.kind();
            let outcome = match self.check(request) {
                Ok((completed, result)) => {
                    let key = ActionKey::new(user_id, campaign_id, kind);
                    let store_error = match self.store.upsert(&key, completed, (self.clock)()) {
                        Ok(()) => None,
                        Err(e) => {
                            warn!(
                                user_id,
                                campaign_id,
                                kind = kind.as_str(),
                                error = %e,
                                "failed to record action check"
                            );
                            Some(e.to_string())
                        }
                    };
                    ReconcileOutcome {
                        kind,
                        success: store_error.is_none(),
                        completed: Some(completed),
                        detail: OutcomeDetail::Result(result),
                        store_error,
                    }
                }
                Err(e) => {
                    warn!(
                        user_id,
                        campaign_id,
                        kind = kind.as_str(),
                        error_kind = e.kind().as_str(),
                        error = %e,
                        "action check failed; record left unchanged"
                    );
                    ReconcileOutcome {
                        kind,
                        success: false,
                        completed: None,
                        detail: OutcomeDetail::Error(e),
                        store_error: None,
                    }
                }
            };
            outcomes.insert(kind, outcome);
        }

        let completed = outcomes
            .values()
            .filter(|o| o.completed == Some(true))
            .count();
        let failed = outcomes.values().filter(|o| !o.success).count();
        info!(
            user_id,
            campaign_id,
            checked = outcomes.len(),
            completed,
            failed,
            "reconciled campaign actions"
        );
        outcomes
    }

    fn check(&self, request: &ActionRequest) -> Result<(bool, Value), ApiError> {
        let kind = request.kind();
        let result = self.client.execute(request)?;
        let completed = kind.completion_from(&result).ok_or_else(|| {
            ApiError::Decode(format!(
                "result has no boolean '{}' field",
                kind.completion_field()
            ))
        })?;
        Ok((completed, result))
    }
}
