//! ---
//! seed_section: "01-core-data-model"
//! seed_subsection: "module"
//! seed_type: "source"
//! seed_scope: "code"
//! seed_description: "Shared primitives for the Deskseed pipelines."
//! seed_version: "v0.0.0-prealpha"
//! seed_owner: "tbd"
//! ---
//! Core shared primitives for the Deskseed workspace.
//! This crate exposes the run identity and naming scheme, the entity
//! data model shared by the provisioner and reclaimer, run manifest
//! persistence, and tracing initialisation.

#![warn(missing_docs)]

pub mod logging;
pub mod manifest;
pub mod model;
pub mod run;

pub use manifest::RunManifest;
pub use model::{Organization, Ticket, User};
pub use run::{NamingScheme, RunIdentity, EMAIL_DOMAIN};
