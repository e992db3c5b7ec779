//! Query parameter declarations and criteria assembly for the audit list.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::PagingConfig;
use crate::error::{AppError, Result};
use crate::filters::{DateTimeFilter, EntityNameFilter, IdentifierToReferenceFilter, ParameterFilter, TimeRange};
use crate::models::{ActorRef, AuditAction};
use crate::pagination::Paging;
use crate::services::{ActorResolver, EntityClassResolver};

/// A supported query parameter and the pattern its value must match in full.
pub struct QueryParam {
    pub name: &'static str,
    pattern: Regex,
    pub description: &'static str,
}

impl QueryParam {
    fn new(name: &'static str, pattern: &str, description: &'static str) -> Self {
        let pattern = Regex::new(&format!("^(?:{})$", pattern)).expect("query param pattern is valid");
        Self {
            name,
            pattern,
            description,
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        self.pattern.is_match(value)
    }
}

pub static AUDIT_LIST_PARAMS: LazyLock<Vec<QueryParam>> = LazyLock::new(|| {
    vec![
        QueryParam::new("page", "[0-9]+", "Page number, starting from 1. Defaults to 1."),
        QueryParam::new("limit", "[0-9]+", "Number of items per page. Defaults to 10."),
        QueryParam::new(
            "loggedAt",
            r"[0-9]{4}(-[0-9]{2}(-[0-9]{2}([T ][0-9]{2}:[0-9]{2}(:[0-9]{2}(\.[0-9]+)?)?(Z|([-+][0-9]{2}(:?[0-9]{2})?))?)?)?)?",
            "Date in RFC 3339 format, e.g. 2009-11-05T13:15:30Z or 2008-07-01T22:35:17+08:00",
        ),
        QueryParam::new("action", "create|update|remove", "Logged action name"),
        QueryParam::new("user", "[0-9]+", "ID of the user who performed the action"),
        QueryParam::new(
            "objectClass",
            "[A-Za-z0-9_]+",
            "Entity full class name, namespace separators replaced with underscores",
        ),
    ]
});

/// Declared parameters that were present, non-empty and matched their pattern.
#[derive(Debug, Default)]
pub struct ValidatedQuery<'a> {
    values: HashMap<&'static str, &'a str>,
}

impl<'a> ValidatedQuery<'a> {
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.values.get(name).copied()
    }
}

/// Check raw query parameters against their declarations.
///
/// Undeclared parameters are ignored and empty values count as absent.
pub fn validate_query<'a>(
    raw: &'a HashMap<String, String>,
    params: &[QueryParam],
) -> Result<ValidatedQuery<'a>> {
    let mut values = HashMap::new();
    for param in params {
        let Some(value) = raw.get(param.name).map(|v| v.trim()).filter(|v| !v.is_empty()) else {
            continue;
        };
        if !param.matches(value) {
            return Err(AppError::BadRequest(format!(
                "Invalid value '{}' for parameter '{}'. {}",
                value, param.name, param.description
            )));
        }
        values.insert(param.name, value);
    }
    Ok(ValidatedQuery { values })
}

fn positive_int(query: &ValidatedQuery, name: &str) -> Result<Option<i64>> {
    let Some(raw) = query.get(name) else {
        return Ok(None);
    };
    match raw.parse::<i64>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(AppError::BadRequest(format!(
            "Parameter '{}' must be a positive integer",
            name
        ))),
    }
}

/// Page defaults to 1, limit to the configured default; limit is capped at the configured maximum.
pub fn parse_paging(query: &ValidatedQuery, config: PagingConfig) -> Result<Paging> {
    let page = positive_int(query, "page")?.unwrap_or(1);
    let limit = positive_int(query, "limit")?
        .unwrap_or(config.default_limit)
        .min(config.max_limit);
    Ok(Paging::new(page, limit))
}

/// Filters applied to an audit list query. `None` fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditCriteria {
    pub logged_at: Option<TimeRange>,
    pub action: Option<AuditAction>,
    pub user: Option<ActorRef>,
    pub object_class: Option<String>,
}

impl AuditCriteria {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

pub struct CriteriaBuilder<'a> {
    actors: &'a dyn ActorResolver,
    entity_classes: &'a dyn EntityClassResolver,
}

impl<'a> CriteriaBuilder<'a> {
    pub fn new(actors: &'a dyn ActorResolver, entity_classes: &'a dyn EntityClassResolver) -> Self {
        Self {
            actors,
            entity_classes,
        }
    }

    /// Run every present filter value through its normalizer.
    ///
    /// Returns `Ok(None)` when the criteria cannot match anything, which
    /// happens when `user` names an actor that does not exist.
    pub fn build(&self, query: &ValidatedQuery) -> Result<Option<AuditCriteria>> {
        let mut criteria = AuditCriteria::default();

        if let Some(raw) = query.get("loggedAt") {
            criteria.logged_at = Some(DateTimeFilter.filter(raw)?);
        }
        if let Some(raw) = query.get("action") {
            let action = raw
                .parse::<AuditAction>()
                .map_err(|_| AppError::BadRequest(format!("Unknown action '{}'", raw)))?;
            criteria.action = Some(action);
        }
        if let Some(raw) = query.get("user") {
            match IdentifierToReferenceFilter::new(self.actors).filter(raw)? {
                Some(actor) => criteria.user = Some(actor),
                None => {
                    tracing::debug!(user = raw, "Audit filter names an unknown user");
                    return Ok(None);
                }
            }
        }
        if let Some(raw) = query.get("objectClass") {
            criteria.object_class = Some(EntityNameFilter::new(self.entity_classes).filter(raw)?);
        }

        Ok(Some(criteria))
    }
}
