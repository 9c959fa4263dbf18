//! ---
//! seed_section: "05-reclamation"
//! seed_subsection: "module"
//! seed_type: "source"
//! seed_scope: "code"
//! seed_description: "Best-effort reclamation pipeline."
//! seed_version: "v0.0.0-prealpha"
//! seed_owner: "tbd"
//! ---
//! The reclamation pipeline: list, classify, delete, for tickets,
//! then users, then organizations, mirroring referential dependency
//! (children before parents).
//!
//! Everything here is best-effort, the opposite of the provisioner's
//! fail-fast policy: a failed delete is logged and skipped, and a
//! stage that cannot even list its collection does not prevent the
//! next stage from running.

#![warn(missing_docs)]

use std::fmt;

use deskseed_transport::TransportError;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

mod classify;
mod delete;
mod lister;

pub use classify::{classify, ClassifiedEntity, MatchStrategy};
pub use delete::Deleter;
pub use lister::PagedLister;

use deskseed_transport::Transport;

/// The three entity collections the pipelines manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// Support tickets; no downstream dependents, deleted first.
    Ticket,
    /// Users; deleted after tickets, before organizations.
    User,
    /// Organizations; parents of users, deleted last.
    Organization,
}

impl EntityKind {
    /// Reclamation order: children before parents.
    pub const RECLAIM_ORDER: [EntityKind; 3] =
        [EntityKind::Ticket, EntityKind::User, EntityKind::Organization];

    /// Path of the collection root.
    pub fn collection_path(self) -> &'static str {
        match self {
            EntityKind::Ticket => "/api/v2/tickets.json",
            EntityKind::User => "/api/v2/users.json",
            EntityKind::Organization => "/api/v2/organizations.json",
        }
    }

    /// Key the list response nests the entity array under.
    pub fn collection_key(self) -> &'static str {
        match self {
            EntityKind::Ticket => "tickets",
            EntityKind::User => "users",
            EntityKind::Organization => "organizations",
        }
    }

    /// Delete path for one entity; users get the force flag so the
    /// platform hard-deletes instead of archiving.
    pub fn delete_path(self, id: u64) -> String {
        match self {
            EntityKind::Ticket => format!("/api/v2/tickets/{id}.json"),
            EntityKind::User => format!("/api/v2/users/{id}.json?force=true"),
            EntityKind::Organization => format!("/api/v2/organizations/{id}.json"),
        }
    }

    /// The remote-visible field classification inspects.
    pub fn visible_field(self, entity: &Value) -> Option<&str> {
        let key = match self {
            EntityKind::Ticket => "subject",
            EntityKind::User => "email",
            EntityKind::Organization => "name",
        };
        entity.get(key).and_then(Value::as_str)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Ticket => "ticket",
            EntityKind::User => "user",
            EntityKind::Organization => "organization",
        };
        f.write_str(name)
    }
}

/// Failure of one list or delete operation.
#[derive(Debug, Error)]
pub enum ReclaimError {
    /// The transport could not complete the call at all.
    #[error("transport failure while {action} {kind}s: {source}")]
    Transport {
        /// What the call was doing ("listing" or "deleting").
        action: &'static str,
        /// Collection being operated on.
        kind: EntityKind,
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },
    /// Listing a collection returned a non-2xx status.
    #[error("listing {kind}s rejected: status {status}, body {body}")]
    ListRejected {
        /// Collection being listed.
        kind: EntityKind,
        /// HTTP status returned by the remote.
        status: u16,
        /// Raw response body for diagnostics.
        body: Value,
    },
    /// Deleting one entity returned a non-2xx status.
    #[error("deleting {kind} {id} rejected: status {status}, body {body}")]
    DeleteRejected {
        /// Kind of the entity.
        kind: EntityKind,
        /// Remote id of the entity.
        id: u64,
        /// HTTP status returned by the remote.
        status: u16,
        /// Raw response body for diagnostics.
        body: Value,
    },
    /// A 2xx list response was missing the entity array.
    #[error("malformed list response for {kind}s: missing {field}")]
    Malformed {
        /// Collection being listed.
        kind: EntityKind,
        /// Missing field name.
        field: &'static str,
    },
}

/// Outcome of one list-classify-delete stage.
#[derive(Debug)]
pub struct StageOutcome {
    /// Collection the stage operated on.
    pub kind: EntityKind,
    /// Entities the classifier marked for deletion.
    pub matched: Vec<ClassifiedEntity>,
    /// Ids successfully deleted.
    pub deleted: Vec<u64>,
    /// Per-entity delete failures, with the rendered error.
    pub failures: Vec<(u64, String)>,
    /// Set when the stage could not list or classify at all.
    pub stage_error: Option<String>,
}

impl StageOutcome {
    fn failed(kind: EntityKind, error: &ReclaimError) -> Self {
        Self {
            kind,
            matched: Vec::new(),
            deleted: Vec::new(),
            failures: Vec::new(),
            stage_error: Some(error.to_string()),
        }
    }
}

/// Outcome of a full reclamation run.
#[derive(Debug)]
pub struct ReclaimReport {
    /// Stage outcomes in execution order.
    pub stages: Vec<StageOutcome>,
}

impl ReclaimReport {
    /// Total entities deleted across all stages.
    pub fn total_deleted(&self) -> usize {
        self.stages.iter().map(|s| s.deleted.len()).sum()
    }

    /// Total entities the classifier matched across all stages.
    pub fn total_matched(&self) -> usize {
        self.stages.iter().map(|s| s.matched.len()).sum()
    }

    /// True when at least one stage listed its collection.
    pub fn any_stage_ran(&self) -> bool {
        self.stages.iter().any(|s| s.stage_error.is_none())
    }
}

/// Best-effort reclamation pipeline.
pub struct Reclaimer<'a> {
    transport: &'a dyn Transport,
    strategy: MatchStrategy,
    dry_run: bool,
}

impl<'a> Reclaimer<'a> {
    /// Bind a classification strategy to a transport.
    pub fn new(transport: &'a dyn Transport, strategy: MatchStrategy) -> Self {
        Self {
            transport,
            strategy,
            dry_run: false,
        }
    }

    /// Classify and report without issuing any deletes.
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Run every stage and return the structured report.
    ///
    /// Never returns an error: stage failures are recorded in the
    /// report and logged, and later stages always run.
    pub async fn run(&self) -> ReclaimReport {
        info!(
            strategy = %self.strategy.describe(),
            dry_run = self.dry_run,
            "reclamation starting (tickets, then users, then organizations)"
        );

        let mut stages = Vec::with_capacity(EntityKind::RECLAIM_ORDER.len());
        for kind in EntityKind::RECLAIM_ORDER {
            let outcome = match self.run_stage(kind).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(kind = %kind, error = %err, "stage failed; continuing with next stage");
                    StageOutcome::failed(kind, &err)
                }
            };
            stages.push(outcome);
        }

        let report = ReclaimReport { stages };
        info!(
            matched = report.total_matched(),
            deleted = report.total_deleted(),
            "reclamation finished"
        );
        report
    }

    async fn run_stage(&self, kind: EntityKind) -> Result<StageOutcome, ReclaimError> {
        let listed = PagedLister::new(self.transport, kind).collect_all().await?;
        let matched = classify(kind, &listed, &self.strategy);
        info!(
            kind = %kind,
            listed = listed.len(),
            matched = matched.len(),
            "collection classified"
        );

        let mut deleted = Vec::new();
        let mut failures = Vec::new();
        if self.dry_run {
            for entity in &matched {
                info!(kind = %kind, id = entity.id, label = %entity.label, "would delete (dry run)");
            }
        } else {
            let deleter = Deleter::new(self.transport);
            for entity in &matched {
                match deleter.delete(kind, entity).await {
                    Ok(()) => deleted.push(entity.id),
                    Err(err) => {
                        warn!(
                            kind = %kind,
                            id = entity.id,
                            label = %entity.label,
                            error = %err,
                            "delete failed; continuing"
                        );
                        failures.push((entity.id, err.to_string()));
                    }
                }
            }
        }

        Ok(StageOutcome {
            kind,
            matched,
            deleted,
            failures,
            stage_error: None,
        })
    }
}
