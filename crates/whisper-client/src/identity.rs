//! Identity calls against the node.
//!
//! Where an identity is stored is the caller's business; it comes in through
//! `IdentitySource`. This module only asks the node whether it knows an
//! identity and, if not, has it generate one.

use whisper_protocol::{wrap_param, IncomingResponse, Identity, Method};

use crate::transport::Transport;
use crate::{ClientError, Result};

/// Supplies the locally known identity, if any.
pub trait IdentitySource {
    fn identity(&self) -> Result<Option<Identity>>;
}

impl<F> IdentitySource for F
where
    F: Fn() -> Result<Option<Identity>>,
{
    fn identity(&self) -> Result<Option<Identity>> {
        self()
    }
}

/// A fixed identity, e.g. read from config.
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub Identity);

impl IdentitySource for StaticIdentity {
    fn identity(&self) -> Result<Option<Identity>> {
        Ok(Some(self.0.clone()))
    }
}

/// `shh_hasIdentity` -- does the node hold the key for `id`?
pub async fn has_identity<T: Transport>(transport: &T, id: &str) -> Result<bool> {
    match transport.send(Method::HasIdentity, wrap_param(id), None).await? {
        IncomingResponse::Bool(known) => {
            tracing::debug!(id, known, "whisper identity check");
            Ok(known)
        }
        other => Err(ClientError::unexpected(Method::HasIdentity, "bool", &other)),
    }
}

/// `shh_newIdentity` -- have the node generate a fresh identity.
pub async fn new_identity<T: Transport>(transport: &T) -> Result<Identity> {
    match transport.send(Method::NewIdentity, Vec::new(), None).await? {
        IncomingResponse::Str(id) if id.is_empty() => Err(ClientError::EmptyResult(Method::NewIdentity)),
        IncomingResponse::Str(id) => {
            tracing::info!(id = %id, "generated whisper identity");
            Ok(id)
        }
        other => Err(ClientError::unexpected(Method::NewIdentity, "string", &other)),
    }
}

/// Use the source's identity if the node knows it, else generate a new one.
///
/// The caller is responsible for persisting a newly generated identity.
pub async fn ensure_identity<T, S>(transport: &T, source: &S) -> Result<Identity>
where
    T: Transport,
    S: IdentitySource + ?Sized,
{
    if let Some(id) = source.identity()? {
        let id = id.trim().to_string();
        if !id.is_empty() && has_identity(transport, &id).await? {
            return Ok(id);
        }
        tracing::info!(id = %id, "node does not know local identity, generating a new one");
    }
    new_identity(transport).await
}
