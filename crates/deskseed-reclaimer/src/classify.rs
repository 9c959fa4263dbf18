//! ---
//! seed_section: "05-reclamation"
//! seed_subsection: "module"
//! seed_type: "source"
//! seed_scope: "code"
//! seed_description: "Classification of listed entities against the naming scheme."
//! seed_version: "v0.0.0-prealpha"
//! seed_owner: "tbd"
//! ---
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use deskseed_common::{RunIdentity, RunManifest};

use crate::EntityKind;

// Structural fallbacks for runs whose exact identity was lost. The
// 13+ digit token targets epoch-millisecond run identities; it will
// not match short hand-picked labels, which is intentional: loose
// matching must stay conservative.
static HEURISTIC_ORG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.+ Org \d+ \(.*\d{13,}.*\)$").expect("valid org heuristic"));
static HEURISTIC_USER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^user\d+-[^@]+@example\.com$").expect("valid user heuristic"));
static HEURISTIC_TICKET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Issue \d+ \(.*\d{13,}.*\)$").expect("valid ticket heuristic"));

/// How listed entities are matched to provisioned demo data.
///
/// The strategy is an explicit configuration input, never a hidden
/// default; the reclaimer logs [`MatchStrategy::describe`] at the
/// start of every invocation.
#[derive(Debug, Clone)]
pub enum MatchStrategy {
    /// Exact run marker match. Zero false positives across runs,
    /// zero false negatives for entities this scheme produced.
    RunScoped(RunIdentity),
    /// Structural pattern match for recovering data from runs whose
    /// identity was lost. May match any run of this tool.
    Heuristic,
    /// Membership in a persisted manifest of created ids. Zero false
    /// positives of any kind.
    Manifest(RunManifest),
}

impl MatchStrategy {
    /// Human-readable description of the active strategy.
    pub fn describe(&self) -> String {
        match self {
            MatchStrategy::RunScoped(run) => format!("run-scoped match for {run}"),
            MatchStrategy::Heuristic => "heuristic structural match (any recognisable run)".into(),
            MatchStrategy::Manifest(manifest) => {
                format!(
                    "manifest of run {} ({} recorded ids)",
                    manifest.run,
                    manifest.len()
                )
            }
        }
    }

    /// Decide whether one listed entity belongs to provisioned data.
    pub fn matches(&self, kind: EntityKind, entity: &Value) -> bool {
        match self {
            MatchStrategy::RunScoped(run) => match kind.visible_field(entity) {
                Some(field) => match kind {
                    EntityKind::Organization | EntityKind::Ticket => {
                        field.contains(&format!("({run})"))
                    }
                    EntityKind::User => field.contains(&format!("-{run}@")),
                },
                None => false,
            },
            MatchStrategy::Heuristic => match kind.visible_field(entity) {
                Some(field) => match kind {
                    EntityKind::Organization => HEURISTIC_ORG.is_match(field),
                    EntityKind::User => HEURISTIC_USER.is_match(field),
                    EntityKind::Ticket => HEURISTIC_TICKET.is_match(field),
                },
                None => false,
            },
            MatchStrategy::Manifest(manifest) => match entity.get("id").and_then(Value::as_u64) {
                Some(id) => match kind {
                    EntityKind::Organization => manifest.organizations.contains(&id),
                    EntityKind::User => manifest.users.contains(&id),
                    EntityKind::Ticket => manifest.tickets.contains(&id),
                },
                None => false,
            },
        }
    }
}

/// A listed entity the classifier marked for deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEntity {
    /// Remote identifier.
    pub id: u64,
    /// The visible field that matched, for logs and reports.
    pub label: String,
}

/// Filter a listed collection down to the entities the strategy
/// recognises. Entities without a numeric id are skipped with a
/// warning since they cannot be deleted anyway.
pub fn classify(
    kind: EntityKind,
    entities: &[Value],
    strategy: &MatchStrategy,
) -> Vec<ClassifiedEntity> {
    let mut matched = Vec::new();
    for entity in entities {
        if !strategy.matches(kind, entity) {
            continue;
        }
        let Some(id) = entity.get("id").and_then(Value::as_u64) else {
            warn!(kind = %kind, entity = %entity, "matched entity has no id; skipping");
            continue;
        };
        let label = kind
            .visible_field(entity)
            .unwrap_or("<unnamed>")
            .to_owned();
        matched.push(ClassifiedEntity { id, label });
    }
    matched
}
