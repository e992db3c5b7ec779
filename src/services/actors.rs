use crate::db::{DbPool, queries};
use crate::error::Result;
use crate::models::ActorRef;

/// Resolves an actor id to a reference usable as a filter value.
pub trait ActorResolver: Send + Sync {
    /// `Ok(None)` when no actor has this id.
    fn resolve_actor(&self, id: i64) -> Result<Option<ActorRef>>;
}

pub struct SqliteActorResolver {
    pool: DbPool,
}

impl SqliteActorResolver {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ActorResolver for SqliteActorResolver {
    fn resolve_actor(&self, id: i64) -> Result<Option<ActorRef>> {
        let conn = self.pool.get()?;
        let user = queries::get_user_by_id(&conn, id)?;
        Ok(user.as_ref().map(ActorRef::from))
    }
}
