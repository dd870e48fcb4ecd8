//! `xcheck-core`: client SDK for the X scraping verification API.
//!
//! ```text
//! ActionClient   ← one call per check kind; Transport → decode → classify
//!     │
//!     ├─► BatchRunner  ← ordered, sequential, paced; per-item failure isolation
//!     │
//!     └─► Reconciler   ← check + upsert into an ActionStore keyed by
//!                         (user, campaign, action kind)
//! ```

pub mod batch;
pub mod classify;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod reconcile;
pub mod store;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{ActionOutcome, BatchRunner, OutcomeDetail, Pacing};
pub use client::ActionClient;
pub use config::ClientConfig;
pub use error::{ApiError, ErrorKind, Result, XcheckError};
pub use reconcile::{ReconcileOutcome, ReconcileReport, Reconciler};
pub use store::{
    ActionKey, ActionStore, MemoryActionStore, PersistedActionRecord, RedbActionStore,
    SqliteActionStore,
};
pub use types::{ActionKind, ActionRequest};
