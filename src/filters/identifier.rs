use crate::error::{AppError, Result};
use crate::models::ActorRef;
use crate::services::ActorResolver;

use super::ParameterFilter;

/// Resolves a numeric actor id into an actor reference.
/// Yields `None` when the id names no actor.
pub struct IdentifierToReferenceFilter<'a> {
    resolver: &'a dyn ActorResolver,
}

impl<'a> IdentifierToReferenceFilter<'a> {
    pub fn new(resolver: &'a dyn ActorResolver) -> Self {
        Self { resolver }
    }
}

impl ParameterFilter for IdentifierToReferenceFilter<'_> {
    type Output = Option<ActorRef>;

    fn filter(&self, raw: &str) -> Result<Option<ActorRef>> {
        let id: i64 = raw
            .parse()
            .map_err(|_| AppError::BadRequest(format!("Invalid identifier '{}'", raw)))?;
        self.resolver.resolve_actor(id)
    }
}
