//! ---
//! seed_section: "04-provisioning"
//! seed_subsection: "module"
//! seed_type: "source"
//! seed_scope: "code"
//! seed_description: "Per-entity creators speaking the remote wire contract."
//! seed_version: "v0.0.0-prealpha"
//! seed_owner: "tbd"
//! ---
use deskseed_common::{Organization, Ticket, User};
use deskseed_transport::{Method, Transport};
use serde_json::json;
use tracing::{debug, info};

use crate::{
    organization_body, user_body, warn_identity_attach, ProvisionError, ORGANIZATIONS_PATH,
    TICKETS_PATH, TICKET_BODY, USERS_PATH,
};

/// Creates organizations through the injected transport.
pub struct OrganizationCreator<'a> {
    transport: &'a dyn Transport,
}

impl<'a> OrganizationCreator<'a> {
    /// Bind the creator to a transport.
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// Create one organization; any failure aborts the pipeline.
    pub async fn create(
        &self,
        name: &str,
        tag: Option<&str>,
    ) -> Result<Organization, ProvisionError> {
        const STAGE: &str = "organization creation";
        let body = organization_body(name, tag);
        let response = self
            .transport
            .send(Method::Post, ORGANIZATIONS_PATH, Some(&body))
            .await
            .map_err(|source| ProvisionError::Transport {
                stage: STAGE,
                source,
            })?;
        if !response.ok() {
            return Err(ProvisionError::rejected(STAGE, response));
        }

        let id = response.body["organization"]["id"]
            .as_u64()
            .ok_or(ProvisionError::Malformed {
                stage: STAGE,
                field: "organization.id",
            })?;
        let echoed = response.body["organization"]["name"]
            .as_str()
            .unwrap_or(name)
            .to_owned();
        info!(id, name = %echoed, "organization created");
        Ok(Organization {
            id,
            name: echoed,
            tag: tag.map(str::to_owned),
        })
    }
}

/// Creates users and attaches their secondary email identity.
pub struct UserCreator<'a> {
    transport: &'a dyn Transport,
}

impl<'a> UserCreator<'a> {
    /// Bind the creator to a transport.
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// Create one user bound to an organization, then attach the
    /// secondary email. Attachment failure is non-fatal: the user and
    /// the downstream ticket linkage stay valid without it.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        alt_email: &str,
        organization_id: u64,
        tag: Option<&str>,
    ) -> Result<User, ProvisionError> {
        const STAGE: &str = "user creation";
        let body = user_body(name, email, organization_id, tag);
        let response = self
            .transport
            .send(Method::Post, USERS_PATH, Some(&body))
            .await
            .map_err(|source| ProvisionError::Transport {
                stage: STAGE,
                source,
            })?;
        if !response.ok() {
            return Err(ProvisionError::rejected(STAGE, response));
        }

        let id = response.body["user"]["id"]
            .as_u64()
            .ok_or(ProvisionError::Malformed {
                stage: STAGE,
                field: "user.id",
            })?;
        let echoed = response.body["user"]["name"]
            .as_str()
            .unwrap_or(name)
            .to_owned();
        info!(id, email, alt_email, "user created");

        self.attach_identity(id, email, alt_email).await;

        Ok(User {
            id,
            name: echoed,
            email: email.to_owned(),
            alt_email: alt_email.to_owned(),
            organization_id,
            tag: tag.map(str::to_owned),
        })
    }

    async fn attach_identity(&self, user_id: u64, email: &str, alt_email: &str) {
        let path = format!("/api/v2/users/{user_id}/identities.json");
        let body = json!({ "identity": { "type": "email", "value": alt_email } });
        match self.transport.send(Method::Post, &path, Some(&body)).await {
            Ok(response) if response.ok() => {
                debug!(user_id, alt_email, "secondary identity attached");
            }
            Ok(response) => {
                let detail = format!(
                    "status {}, body {}",
                    response.status,
                    response.body
                );
                warn_identity_attach(email, alt_email, &detail);
            }
            Err(err) => {
                warn_identity_attach(email, alt_email, &err.to_string());
            }
        }
    }
}

/// Creates tickets through the injected transport.
pub struct TicketCreator<'a> {
    transport: &'a dyn Transport,
}

impl<'a> TicketCreator<'a> {
    /// Bind the creator to a transport.
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// Create one ticket with a single collaborator; any failure
    /// aborts the pipeline.
    pub async fn create(
        &self,
        subject: &str,
        requester_id: u64,
        collaborator_email: &str,
    ) -> Result<Ticket, ProvisionError> {
        const STAGE: &str = "ticket creation";
        let body = json!({ "ticket": {
            "subject": subject,
            "comment": { "body": TICKET_BODY },
            "priority": "normal",
            "requester_id": requester_id,
            "collaborators": [collaborator_email]
        } });
        let response = self
            .transport
            .send(Method::Post, TICKETS_PATH, Some(&body))
            .await
            .map_err(|source| ProvisionError::Transport {
                stage: STAGE,
                source,
            })?;
        if !response.ok() {
            return Err(ProvisionError::rejected(STAGE, response));
        }

        let id = response.body["ticket"]["id"]
            .as_u64()
            .ok_or(ProvisionError::Malformed {
                stage: STAGE,
                field: "ticket.id",
            })?;
        let echoed = response.body["ticket"]["subject"]
            .as_str()
            .unwrap_or(subject)
            .to_owned();
        info!(id, subject = %echoed, requester_id, collaborator = collaborator_email, "ticket created");
        Ok(Ticket {
            id,
            subject: echoed,
            requester_id,
            collaborator_email: collaborator_email.to_owned(),
        })
    }
}
