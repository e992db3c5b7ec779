//! Generic list/get helpers shared by read-only entity endpoints.

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::pagination::{Paginated, Paging};
use crate::services::EntityManager;

/// Fetch one page through the manager and prepare every entity for output.
pub fn handle_get_list<M, F>(
    manager: &M,
    criteria: &M::Criteria,
    paging: Paging,
    prepare: F,
) -> Result<Paginated<Value>>
where
    M: EntityManager + ?Sized,
    F: Fn(&M::Entity) -> Result<Value>,
{
    let (entities, total) = manager.find_page(criteria, paging)?;
    let items = entities.iter().map(prepare).collect::<Result<Vec<_>>>()?;
    Ok(Paginated::new(items, total, paging))
}

/// Fetch a single entity by id and prepare it, or fail with `NotFound`.
pub fn handle_get<M, F>(manager: &M, id: i64, prepare: F) -> Result<Value>
where
    M: EntityManager + ?Sized,
    F: Fn(&M::Entity) -> Result<Value>,
{
    let entity = manager
        .find(id)?
        .ok_or_else(|| AppError::NotFound(format!("{} not found", manager.entity_name())))?;
    prepare(&entity)
}

/// Parse an integer path id, rejecting zero and negatives.
pub fn parse_id(raw: &str) -> Result<i64> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::BadRequest(format!("Invalid id '{}'", raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(matches!(parse_id("0"), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_id("-3"), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_id("abc"), Err(AppError::BadRequest(_))));
    }
}
