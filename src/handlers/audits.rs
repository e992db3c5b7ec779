use std::collections::HashMap;

use axum::extract::{Extension, State};
use serde_json::{Map, Value};

use crate::criteria::{AUDIT_LIST_PARAMS, CriteriaBuilder, parse_paging, validate_query};
use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path, Query};
use crate::middleware::CallerContext;
use crate::models::{Audit, Capability};
use crate::pagination::Paginated;
use crate::services::require_capability;

use super::rest::{handle_get, handle_get_list, parse_id};

/// List audit entries, filtered by `loggedAt`, `action`, `user` and `objectClass`.
pub async fn list_audits(
    State(state): State<AppState>,
    Extension(ctx): Extension<CallerContext>,
    Query(raw): Query<HashMap<String, String>>,
) -> Result<Paginated<Value>> {
    require_capability(state.authorizer.as_ref(), &ctx.user, Capability::AuditHistoryRead)?;

    let query = validate_query(&raw, &AUDIT_LIST_PARAMS)?;
    let paging = parse_paging(&query, state.paging)?;

    let builder = CriteriaBuilder::new(state.actors.as_ref(), state.entity_classes.as_ref());
    let Some(criteria) = builder.build(&query)? else {
        return Ok(Paginated::empty(paging));
    };

    tracing::debug!(
        filtered = !criteria.is_empty(),
        date_precision = ?criteria.logged_at.map(|range| range.precision),
        ?criteria,
        page = paging.page,
        limit = paging.limit,
        "Listing audits"
    );
    handle_get_list(state.audits.as_ref(), &criteria, paging, prepare_audit)
}

/// Get a single audit entry.
pub async fn get_audit(
    State(state): State<AppState>,
    Extension(ctx): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    require_capability(state.authorizer.as_ref(), &ctx.user, Capability::AuditHistoryRead)?;

    let id = parse_id(&id)?;
    let item = handle_get(state.audits.as_ref(), id, prepare_audit)?;
    Ok(Json(item))
}

/// Serialize an audit entry and add the legacy response fields.
pub fn prepare_audit(audit: &Audit) -> Result<Value> {
    match serde_json::to_value(audit) {
        Ok(Value::Object(item)) => Ok(Value::Object(add_legacy_fields(item))),
        Ok(_) => Err(AppError::Internal("Audit did not serialize to an object".into())),
        Err(e) => Err(AppError::Internal(format!("Failed to serialize audit: {}", e))),
    }
}

/// Flatten `user` to the actor id and add the snake_case duplicates
/// (`object_class`, `object_name`, `username`) that older clients read.
///
/// These duplicates are part of the public response format and must not be
/// dropped. Running this on its own output returns the same item.
pub fn add_legacy_fields(mut item: Map<String, Value>) -> Map<String, Value> {
    let (user_id, username) = match item.get("user") {
        Some(Value::Object(actor)) => (
            actor.get("id").cloned().unwrap_or(Value::Null),
            actor.get("username").cloned().unwrap_or(Value::Null),
        ),
        // Already flattened
        Some(id @ Value::Number(_)) => (
            id.clone(),
            item.get("username").cloned().unwrap_or(Value::Null),
        ),
        _ => (Value::Null, Value::Null),
    };

    let object_class = item.get("objectClass").cloned().unwrap_or(Value::Null);
    let object_name = item.get("objectName").cloned().unwrap_or(Value::Null);

    item.insert("user".into(), user_id);
    item.insert("object_class".into(), object_class);
    item.insert("object_name".into(), object_name);
    item.insert("username".into(), username);
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActorRef, AuditAction};
    use chrono::DateTime;

    fn audit(user: Option<ActorRef>) -> Audit {
        Audit {
            id: 1,
            action: AuditAction::Update,
            logged_at: DateTime::from_timestamp(1_257_426_930, 0).unwrap(),
            object_id: Some("15".into()),
            object_class: "Acme\\Bundle\\Entity\\Contact".into(),
            object_name: Some("John Doe".into()),
            version: Some(2),
            user,
            data: serde_json::json!({ "firstName": { "old": "Jon", "new": "John" } }),
        }
    }

    #[test]
    fn test_prepare_audit_with_user() {
        let item = prepare_audit(&audit(Some(ActorRef {
            id: 3,
            username: "admin".into(),
        })))
        .unwrap();

        assert_eq!(item["user"], 3);
        assert_eq!(item["username"], "admin");
        assert_eq!(item["objectClass"], "Acme\\Bundle\\Entity\\Contact");
        assert_eq!(item["object_class"], item["objectClass"]);
        assert_eq!(item["objectName"], "John Doe");
        assert_eq!(item["object_name"], item["objectName"]);
        assert_eq!(item["loggedAt"], "2009-11-05T13:15:30Z");
        assert_eq!(item["action"], "update");
        assert_eq!(item["data"]["firstName"]["new"], "John");
    }

    #[test]
    fn test_prepare_audit_without_user() {
        let item = prepare_audit(&audit(None)).unwrap();
        assert!(item["user"].is_null());
        assert!(item["username"].is_null());
        // Keys are present, not omitted
        assert!(item.as_object().unwrap().contains_key("username"));
    }

    #[test]
    fn test_add_legacy_fields_is_idempotent() {
        let item = prepare_audit(&audit(Some(ActorRef {
            id: 3,
            username: "admin".into(),
        })))
        .unwrap();
        let Value::Object(once) = item else {
            panic!("expected object");
        };

        let twice = add_legacy_fields(once.clone());
        assert_eq!(twice, once);
        assert_eq!(twice["objectClass"], "Acme\\Bundle\\Entity\\Contact");
        assert_eq!(twice["objectName"], "John Doe");
    }
}
