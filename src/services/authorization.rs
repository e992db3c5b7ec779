use crate::db::{DbPool, queries};
use crate::error::{AppError, Result};
use crate::models::{Capability, User};

pub trait Authorizer: Send + Sync {
    fn has_capability(&self, caller: &User, capability: Capability) -> Result<bool>;
}

/// Fail with `Forbidden` unless the caller holds the capability.
pub fn require_capability(
    authorizer: &dyn Authorizer,
    caller: &User,
    capability: Capability,
) -> Result<()> {
    if authorizer.has_capability(caller, capability)? {
        return Ok(());
    }
    tracing::warn!(
        user_id = caller.id,
        capability = capability.as_ref(),
        "Capability check denied"
    );
    Err(AppError::Forbidden(format!(
        "Missing capability '{}'",
        capability.as_ref()
    )))
}

/// Capability grants stored in the `user_capabilities` table.
pub struct SqliteAuthorizer {
    pool: DbPool,
}

impl SqliteAuthorizer {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl Authorizer for SqliteAuthorizer {
    fn has_capability(&self, caller: &User, capability: Capability) -> Result<bool> {
        let conn = self.pool.get()?;
        queries::user_has_capability(&conn, caller.id, capability)
    }
}
