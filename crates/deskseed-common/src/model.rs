//! ---
//! seed_section: "01-core-data-model"
//! seed_subsection: "module"
//! seed_type: "source"
//! seed_scope: "code"
//! seed_description: "Entity records shared by the provisioner and reclaimer."
//! seed_version: "v0.0.0-prealpha"
//! seed_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

/// An organization created by the provisioner.
///
/// Once persisted remotely the record is referenced by `id` only; the
/// pipeline holds no authority over it beyond further API calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Organization {
    /// Remote identifier assigned by the platform.
    pub id: u64,
    /// Display name as echoed by the create response.
    pub name: String,
    /// Optional run-scoped tag applied at creation.
    pub tag: Option<String>,
}

/// A user created by the provisioner, bound to one organization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Remote identifier assigned by the platform.
    pub id: u64,
    /// Display name as echoed by the create response.
    pub name: String,
    /// Primary email, deterministically derived from index and run.
    pub email: String,
    /// Secondary email attached as an additional identity.
    pub alt_email: String,
    /// Remote id of the organization the user belongs to.
    pub organization_id: u64,
    /// Optional run-scoped tag applied at creation.
    pub tag: Option<String>,
}

/// A ticket created by the provisioner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ticket {
    /// Remote identifier assigned by the platform.
    pub id: u64,
    /// Subject as echoed by the create response.
    pub subject: String,
    /// Remote id of the requesting user.
    pub requester_id: u64,
    /// Email of the single collaborator CC'd on the ticket.
    pub collaborator_email: String,
}
