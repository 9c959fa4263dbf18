//! ---
//! seed_section: "01-core-data-model"
//! seed_subsection: "module"
//! seed_type: "source"
//! seed_scope: "code"
//! seed_description: "Run identity and deterministic naming scheme."
//! seed_version: "v0.0.0-prealpha"
//! seed_owner: "tbd"
//! ---
use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Prefix applied to clock-derived run identities.
pub const RUN_PREFIX: &str = "seedgen";

/// Fixed domain used for every generated user email address.
pub const EMAIL_DOMAIN: &str = "example.com";

/// Opaque token scoping one provisioning run.
///
/// The identity is embedded into every generated organization name,
/// user email, and ticket subject, which is what lets the reclaimer
/// (or a human scanning the tenant) recognise the run's artifacts
/// later without any local state. Created once at pipeline start and
/// never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunIdentity(String);

impl RunIdentity {
    /// Derive a fresh identity from the epoch-millisecond clock.
    ///
    /// Millisecond resolution keeps identities unique across manual
    /// invocations; concurrent runs on the same tenant are out of
    /// scope.
    pub fn from_clock() -> Self {
        Self(format!("{}-{}", RUN_PREFIX, Utc::now().timestamp_millis()))
    }

    /// Use an explicit label as the run identity.
    pub fn from_label(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Borrow the underlying token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deterministic naming scheme shared by the provisioner and the
/// reclaimer's run-scoped classifier.
///
/// Every method is a pure function of the run identity and an index,
/// so re-running a pipeline with the same identity reproduces the
/// exact same names. That determinism is the invariant the reclaimer
/// relies on: anything the scheme produced can be re-matched from the
/// entity's remote-visible fields alone.
#[derive(Debug, Clone)]
pub struct NamingScheme {
    label: String,
    run: RunIdentity,
}

impl NamingScheme {
    /// Build a scheme for the given display label and run identity.
    pub fn new(label: impl Into<String>, run: RunIdentity) -> Self {
        Self {
            label: label.into(),
            run,
        }
    }

    /// The run identity the scheme embeds.
    pub fn run(&self) -> &RunIdentity {
        &self.run
    }

    /// Organization display name for a 1-based index.
    pub fn organization_name(&self, index: usize) -> String {
        format!("{} Org {} ({})", self.label, index, self.run)
    }

    /// User display name for a 1-based index.
    pub fn user_name(&self, index: usize) -> String {
        format!("{} User {} ({})", self.label, index, self.run)
    }

    /// Primary email for a 1-based index, unique across runs.
    pub fn primary_email(&self, index: usize) -> String {
        format!("user{}-{}@{}", index, self.run, EMAIL_DOMAIN)
    }

    /// Secondary email attached as an additional identity.
    pub fn secondary_email(&self, index: usize) -> String {
        format!("user{}-{}+alt@{}", index, self.run, EMAIL_DOMAIN)
    }

    /// Ticket subject for a 1-based index.
    pub fn ticket_subject(&self, index: usize) -> String {
        format!("Issue {} ({})", index, self.run)
    }

    /// The parenthesised run marker embedded in names and subjects.
    pub fn run_marker(&self) -> String {
        format!("({})", self.run)
    }
}
