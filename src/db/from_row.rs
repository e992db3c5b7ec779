//! Row mapping shared by the query functions.

use chrono::DateTime;
use rusqlite::{Connection, OptionalExtension, Params, Row, types::Type};
use serde_json::Value;

use crate::error::Result;
use crate::models::{ActorRef, ApiKey, Audit, AuditAction, User};

pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

pub const USER_COLS: &str = "id, username, email, created_at";

pub const API_KEY_COLS: &str = "id, user_id, prefix, key_hash, created_at, revoked_at";

/// Audit columns, joined with the acting user (`a` = audits, `u` = users).
pub const AUDIT_COLS: &str = "a.id, a.action, a.logged_at, a.object_id, a.object_class, \
     a.object_name, a.version, a.user_id, u.username, a.data";

pub const AUDIT_FROM: &str = "audits a LEFT JOIN users u ON u.id = a.user_id";

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl FromRow for ApiKey {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ApiKey {
            id: row.get(0)?,
            user_id: row.get(1)?,
            prefix: row.get(2)?,
            key_hash: row.get(3)?,
            created_at: row.get(4)?,
            revoked_at: row.get(5)?,
        })
    }
}

impl FromRow for Audit {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let action: String = row.get(1)?;
        let action = action
            .parse::<AuditAction>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

        let logged_at: i64 = row.get(2)?;
        let logged_at = DateTime::from_timestamp(logged_at, 0).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                Type::Integer,
                format!("timestamp {} out of range", logged_at).into(),
            )
        })?;

        let user_id: Option<i64> = row.get(7)?;
        let username: Option<String> = row.get(8)?;
        let user = match (user_id, username) {
            (Some(id), Some(username)) => Some(ActorRef { id, username }),
            _ => None,
        };

        let data: Option<String> = row.get(9)?;

        Ok(Audit {
            id: row.get(0)?,
            action,
            logged_at,
            object_id: row.get(3)?,
            object_class: row.get(4)?,
            object_name: row.get(5)?,
            version: row.get(6)?,
            user,
            data: data.map(parse_data).unwrap_or(Value::Null),
        })
    }
}

/// Stored payloads are JSON; anything else is passed through as the raw text.
fn parse_data(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

pub fn query_one<T: FromRow, P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Option<T>> {
    Ok(conn.query_row(sql, params, T::from_row).optional()?)
}

pub fn query_all<T: FromRow, P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
