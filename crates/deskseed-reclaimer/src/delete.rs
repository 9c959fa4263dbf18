//! ---
//! seed_section: "05-reclamation"
//! seed_subsection: "module"
//! seed_type: "source"
//! seed_scope: "code"
//! seed_description: "Best-effort deletion of classified entities."
//! seed_version: "v0.0.0-prealpha"
//! seed_owner: "tbd"
//! ---
use deskseed_transport::{Method, Transport};
use tracing::info;

use crate::{ClassifiedEntity, EntityKind, ReclaimError};

/// Issues delete requests for classified entities.
pub struct Deleter<'a> {
    transport: &'a dyn Transport,
}

impl<'a> Deleter<'a> {
    /// Bind the deleter to a transport.
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// Delete one entity.
    ///
    /// Users are deleted with `force=true`: the platform archives
    /// them by default, and cleanup must free the email address for
    /// re-creation. The caller treats any returned error as
    /// best-effort and continues.
    pub async fn delete(&self, kind: EntityKind, entity: &ClassifiedEntity) -> Result<(), ReclaimError> {
        let path = kind.delete_path(entity.id);
        let response = self
            .transport
            .send(Method::Delete, &path, None)
            .await
            .map_err(|source| ReclaimError::Transport {
                action: "deleting",
                kind,
                source,
            })?;
        if !response.ok() {
            return Err(ReclaimError::DeleteRejected {
                kind,
                id: entity.id,
                status: response.status,
                body: response.body,
            });
        }
        info!(kind = %kind, id = entity.id, label = %entity.label, "entity deleted");
        Ok(())
    }
}
