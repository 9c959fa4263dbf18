//! ---
//! seed_section: "01-core-data-model"
//! seed_subsection: "module"
//! seed_type: "source"
//! seed_scope: "code"
//! seed_description: "Per-run manifest of created remote entity ids."
//! seed_version: "v0.0.0-prealpha"
//! seed_owner: "tbd"
//! ---
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::run::RunIdentity;

/// Record of every remote id a provisioning run created.
///
/// When persisted, the manifest is the zero-false-positive alternative
/// to pattern classification: reclaiming by manifest deletes exactly
/// the recorded ids and nothing else, regardless of what else on the
/// tenant happens to match the naming scheme.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunManifest {
    /// Run identity the recorded ids belong to.
    pub run: RunIdentity,
    /// Timestamp (UTC) when the manifest was created.
    pub created_at: DateTime<Utc>,
    /// Remote ids of created organizations.
    pub organizations: Vec<u64>,
    /// Remote ids of created users.
    pub users: Vec<u64>,
    /// Remote ids of created tickets.
    pub tickets: Vec<u64>,
}

impl RunManifest {
    /// Start an empty manifest for the given run.
    pub fn new(run: RunIdentity) -> Self {
        Self {
            run,
            created_at: Utc::now(),
            organizations: Vec::new(),
            users: Vec::new(),
            tickets: Vec::new(),
        }
    }

    /// Record a created organization id.
    pub fn record_organization(&mut self, id: u64) {
        self.organizations.push(id);
    }

    /// Record a created user id.
    pub fn record_user(&mut self, id: u64) {
        self.users.push(id);
    }

    /// Record a created ticket id.
    pub fn record_ticket(&mut self, id: u64) {
        self.tickets.push(id);
    }

    /// Total number of recorded entities.
    pub fn len(&self) -> usize {
        self.organizations.len() + self.users.len() + self.tickets.len()
    }

    /// True when nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Persist the manifest as TOML at the given path.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("unable to create manifest directory {}", parent.display())
                })?;
            }
        }
        let serialized = toml::to_string_pretty(self)
            .with_context(|| "failed to serialise run manifest to TOML")?;
        fs::write(path, serialized)
            .with_context(|| format!("unable to write manifest to {}", path.display()))
    }

    /// Load a manifest previously written by [`RunManifest::persist`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("failed to parse manifest {}", path.display()))
    }
}
