use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use super::ActorRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Remove,
}

/// A persisted audit entry. Written elsewhere, only ever read here.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    pub id: i64,
    pub action: AuditAction,
    pub logged_at: DateTime<Utc>,
    /// Identifier of the audited entity instance
    pub object_id: Option<String>,
    /// Canonical entity class name, e.g. `Acme\Bundle\Entity\Contact`
    pub object_class: String,
    pub object_name: Option<String>,
    pub version: Option<i32>,
    /// None for system-initiated changes
    pub user: Option<ActorRef>,
    /// Changed-field diffs, passed through as stored
    pub data: serde_json::Value,
}
