//! ---
//! seed_section: "04-provisioning"
//! seed_subsection: "module"
//! seed_type: "source"
//! seed_scope: "code"
//! seed_description: "Dependency-ordered provisioning pipeline."
//! seed_version: "v0.0.0-prealpha"
//! seed_owner: "tbd"
//! ---
//! The provisioning pipeline: organizations, then users (with a
//! secondary identity each), then tickets, in strict dependency order.
//!
//! Creation is fail-fast: any rejected or failed create aborts the
//! run without rolling back what was already created. Cleanup is the
//! reclaimer's job. The sole recoverable sub-step is secondary
//! identity attachment, which downgrades to a warning.

#![warn(missing_docs)]

use deskseed_common::{NamingScheme, Organization, RunIdentity, RunManifest, Ticket, User};
use deskseed_transport::{ApiResponse, Transport, TransportError};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

mod creators;

pub use creators::{OrganizationCreator, TicketCreator, UserCreator};

/// Collection endpoint for organizations.
pub const ORGANIZATIONS_PATH: &str = "/api/v2/organizations.json";
/// Collection endpoint for users.
pub const USERS_PATH: &str = "/api/v2/users.json";
/// Collection endpoint for tickets.
pub const TICKETS_PATH: &str = "/api/v2/tickets.json";

/// Fixed placeholder body for every created ticket.
pub const TICKET_BODY: &str = "Created by the Deskseed provisioner";

/// Failure of the fail-fast creation path.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The transport could not complete the call at all.
    #[error("transport failure during {stage}: {source}")]
    Transport {
        /// Pipeline stage that issued the call.
        stage: &'static str,
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },
    /// The remote rejected the create with a non-2xx status.
    #[error("{stage} rejected by remote: status {status}, error {error_code:?}, description {description:?}")]
    Rejected {
        /// Pipeline stage that issued the call.
        stage: &'static str,
        /// HTTP status returned by the remote.
        status: u16,
        /// Remote `error` field, verbatim.
        error_code: Option<String>,
        /// Remote `description` field, verbatim.
        description: Option<String>,
        /// Raw response body for diagnostics.
        body: Value,
    },
    /// A 2xx response was missing an expected field.
    #[error("malformed {stage} response: missing {field}")]
    Malformed {
        /// Pipeline stage that issued the call.
        stage: &'static str,
        /// Dotted path of the missing field.
        field: &'static str,
    },
}

impl ProvisionError {
    /// Build a [`ProvisionError::Rejected`] from a non-2xx response,
    /// logging the structured diagnostics the same way for every stage.
    fn rejected(stage: &'static str, response: ApiResponse) -> Self {
        let error_code = response.error_code();
        let description = response.description();
        tracing::error!(
            stage,
            status = response.status,
            error = error_code.as_deref().unwrap_or(""),
            description = description.as_deref().unwrap_or(""),
            body = %response.body,
            "remote rejected create"
        );
        ProvisionError::Rejected {
            stage,
            status: response.status,
            error_code,
            description,
            body: response.body,
        }
    }
}

/// What one provisioning run should create.
#[derive(Debug, Clone)]
pub struct ProvisionPlan {
    /// Number of organization/user/ticket triples.
    pub count: usize,
    /// Display label embedded in generated names.
    pub label: String,
    /// Run identity scoping this invocation.
    pub run: RunIdentity,
    /// Optional run-scoped tag added to org and user create bodies.
    pub tag: Option<String>,
    /// Maximum create requests in flight within one stage.
    ///
    /// The default of 1 keeps calls strictly sequential, which also
    /// makes fail-fast exact: nothing is issued after a failure.
    /// Higher limits may let already-in-flight creations complete.
    pub stage_concurrency: usize,
}

impl ProvisionPlan {
    /// Plan a run of `count` triples under the given label and run.
    pub fn new(count: usize, label: impl Into<String>, run: RunIdentity) -> Self {
        Self {
            count,
            label: label.into(),
            run,
            tag: None,
            stage_concurrency: 1,
        }
    }

    /// Tag created organizations and users with a run-scoped tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Allow up to `limit` creates in flight within a stage.
    pub fn with_stage_concurrency(mut self, limit: usize) -> Self {
        self.stage_concurrency = limit.max(1);
        self
    }
}

/// Everything one provisioning run created.
#[derive(Debug, Clone)]
pub struct ProvisionReport {
    /// Run identity of the completed run.
    pub run: RunIdentity,
    /// Created organizations, in index order.
    pub organizations: Vec<Organization>,
    /// Created users, in index order.
    pub users: Vec<User>,
    /// Created tickets, in index order.
    pub tickets: Vec<Ticket>,
    /// Manifest of created remote ids, ready to persist.
    pub manifest: RunManifest,
}

/// Staged fail-fast creation pipeline.
pub struct Provisioner<'a> {
    transport: &'a dyn Transport,
    plan: ProvisionPlan,
    scheme: NamingScheme,
}

impl<'a> Provisioner<'a> {
    /// Bind a plan to a transport.
    pub fn new(transport: &'a dyn Transport, plan: ProvisionPlan) -> Self {
        let scheme = NamingScheme::new(plan.label.clone(), plan.run.clone());
        Self {
            transport,
            plan,
            scheme,
        }
    }

    /// Execute all three stages and return the full report.
    ///
    /// Stages are hard barriers: no user create is issued until every
    /// organization exists, and no ticket create until every user
    /// exists. Inside a stage, creates run through an
    /// order-preserving bounded-concurrency stream.
    pub async fn run(&self) -> Result<ProvisionReport, ProvisionError> {
        info!(
            run = %self.plan.run,
            count = self.plan.count,
            concurrency = self.plan.stage_concurrency,
            "provisioning run starting"
        );

        let organizations = self.create_organizations().await?;
        let users = self.create_users(&organizations).await?;
        let tickets = self.create_tickets(&users).await?;

        let mut manifest = RunManifest::new(self.plan.run.clone());
        for org in &organizations {
            manifest.record_organization(org.id);
        }
        for user in &users {
            manifest.record_user(user.id);
        }
        for ticket in &tickets {
            manifest.record_ticket(ticket.id);
        }

        info!(
            run = %self.plan.run,
            organizations = organizations.len(),
            users = users.len(),
            tickets = tickets.len(),
            "provisioning run complete"
        );
        Ok(ProvisionReport {
            run: self.plan.run.clone(),
            organizations,
            users,
            tickets,
            manifest,
        })
    }

    async fn create_organizations(&self) -> Result<Vec<Organization>, ProvisionError> {
        let creator = OrganizationCreator::new(self.transport);
        let tag = self.plan.tag.as_deref();
        let stage = (1..=self.plan.count).map(|index| {
            let creator = &creator;
            let name = self.scheme.organization_name(index);
            async move { creator.create(&name, tag).await }
        });
        bounded(stage, self.plan.stage_concurrency).await
    }

    async fn create_users(
        &self,
        organizations: &[Organization],
    ) -> Result<Vec<User>, ProvisionError> {
        let creator = UserCreator::new(self.transport);
        let tag = self.plan.tag.as_deref();
        let stage = organizations.iter().enumerate().map(|(offset, org)| {
            let creator = &creator;
            let index = offset + 1;
            let name = self.scheme.user_name(index);
            let email = self.scheme.primary_email(index);
            let alt_email = self.scheme.secondary_email(index);
            async move { creator.create(&name, &email, &alt_email, org.id, tag).await }
        });
        bounded(stage, self.plan.stage_concurrency).await
    }

    async fn create_tickets(&self, users: &[User]) -> Result<Vec<Ticket>, ProvisionError> {
        let creator = TicketCreator::new(self.transport);
        let stage = (0..users.len()).map(|offset| {
            let creator = &creator;
            let subject = self.scheme.ticket_subject(offset + 1);
            let requester = &users[offset];
            // Circular assignment: the last user collaborates on the
            // first user's ticket.
            let collaborator = &users[(offset + 1) % users.len()];
            async move {
                creator
                    .create(&subject, requester.id, &collaborator.email)
                    .await
            }
        });
        bounded(stage, self.plan.stage_concurrency).await
    }
}

/// Drive a stage's creation futures with bounded, order-preserving
/// concurrency, stopping at the first failure.
async fn bounded<T, Fut>(
    stage: impl Iterator<Item = Fut>,
    limit: usize,
) -> Result<Vec<T>, ProvisionError>
where
    Fut: std::future::Future<Output = Result<T, ProvisionError>>,
{
    stream::iter(stage)
        .buffered(limit.max(1))
        .try_collect()
        .await
}

/// Log a failed secondary-identity attachment without aborting.
pub(crate) fn warn_identity_attach(email: &str, alt_email: &str, detail: &str) {
    warn!(
        email,
        alt_email, detail, "could not attach secondary identity; continuing"
    );
}

/// Build the org create body, adding `tags` only when a tag is set so
/// the default body matches the wire contract byte for byte.
pub(crate) fn organization_body(name: &str, tag: Option<&str>) -> Value {
    match tag {
        Some(tag) => json!({ "organization": { "name": name, "tags": [tag] } }),
        None => json!({ "organization": { "name": name } }),
    }
}

/// Build the user create body, adding `tags` only when a tag is set.
pub(crate) fn user_body(name: &str, email: &str, organization_id: u64, tag: Option<&str>) -> Value {
    match tag {
        Some(tag) => json!({
            "user": { "name": name, "email": email, "organization_id": organization_id, "tags": [tag] }
        }),
        None => json!({
            "user": { "name": name, "email": email, "organization_id": organization_id }
        }),
    }
}
