use chrono::Utc;
use rusqlite::{Connection, params, params_from_iter, types::Value};

use crate::criteria::AuditCriteria;
use crate::error::{AppError, Result};
use crate::models::*;
use crate::pagination::Paging;
use crate::util::hash_api_key;

use super::from_row::{API_KEY_COLS, AUDIT_COLS, AUDIT_FROM, USER_COLS, query_all, query_one};

fn now() -> i64 {
    Utc::now().timestamp()
}

// ============ Users ============

pub fn create_user(conn: &Connection, input: &CreateUser) -> Result<User> {
    let now = now();

    conn.execute(
        "INSERT INTO users (username, email, created_at) VALUES (?1, ?2, ?3)",
        params![&input.username, &input.email, now],
    )?;

    Ok(User {
        id: conn.last_insert_rowid(),
        username: input.username.clone(),
        email: input.email.clone(),
        created_at: now,
    })
}

pub fn get_user_by_id(conn: &Connection, id: i64) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        [id],
    )
}

pub fn get_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE username = ?1", USER_COLS),
        [username],
    )
}

// ============ API Keys ============

/// Generate a new random API key. Only its hash is ever stored.
pub fn generate_api_key() -> String {
    use rand::Rng;
    let bytes: [u8; 24] = rand::thread_rng().r#gen();
    format!("da_{}", hex::encode(bytes))
}

/// Store a new key for the user. Returns the stored record and the raw key,
/// which is not recoverable afterwards.
pub fn create_api_key(conn: &Connection, user_id: i64) -> Result<(ApiKey, String)> {
    let raw = generate_api_key();
    let prefix: String = raw.chars().take(8).collect();
    let key_hash = hash_api_key(&raw);
    let now = now();

    conn.execute(
        "INSERT INTO api_keys (user_id, prefix, key_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, &prefix, &key_hash, now],
    )?;

    let key = ApiKey {
        id: conn.last_insert_rowid(),
        user_id,
        prefix,
        key_hash,
        created_at: now,
        revoked_at: None,
    };
    Ok((key, raw))
}

pub fn list_api_keys(conn: &Connection, user_id: i64) -> Result<Vec<ApiKey>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM api_keys WHERE user_id = ?1 ORDER BY created_at DESC",
            API_KEY_COLS
        ),
        [user_id],
    )
}

pub fn revoke_api_key(conn: &Connection, key_id: i64) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE api_keys SET revoked_at = ?1 WHERE id = ?2 AND revoked_at IS NULL",
        params![now(), key_id],
    )?;
    Ok(affected > 0)
}

/// Revoke every active key of the named user. Returns the keys revoked.
/// Used by the `revoke-keys` command.
pub fn revoke_user_api_keys(conn: &mut Connection, username: &str) -> Result<Vec<ApiKey>> {
    let tx = conn.transaction()?;
    let user = get_user_by_username(&tx, username)?
        .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", username)))?;

    let mut revoked = Vec::new();
    for key in list_api_keys(&tx, user.id)? {
        if key.revoked_at.is_none() && revoke_api_key(&tx, key.id)? {
            revoked.push(key);
        }
    }
    tx.commit()?;
    Ok(revoked)
}

/// Look up the user owning a non-revoked API key.
pub fn get_user_by_api_key(conn: &Connection, api_key: &str) -> Result<Option<User>> {
    let key_hash = hash_api_key(api_key);
    query_one(
        conn,
        "SELECT u.id, u.username, u.email, u.created_at
         FROM api_keys k JOIN users u ON u.id = k.user_id
         WHERE k.key_hash = ?1 AND k.revoked_at IS NULL",
        [&key_hash],
    )
}

// ============ Capabilities ============

pub fn grant_capability(conn: &Connection, user_id: i64, capability: Capability) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO user_capabilities (user_id, capability, granted_at) VALUES (?1, ?2, ?3)",
        params![user_id, capability.as_ref(), now()],
    )?;
    Ok(())
}

pub fn revoke_capability(conn: &Connection, user_id: i64, capability: Capability) -> Result<bool> {
    let affected = conn.execute(
        "DELETE FROM user_capabilities WHERE user_id = ?1 AND capability = ?2",
        params![user_id, capability.as_ref()],
    )?;
    Ok(affected > 0)
}

/// Remove the audit read capability from the named user. Returns false if
/// the user did not hold it. Used by the `revoke` command.
pub fn revoke_reader(conn: &Connection, username: &str) -> Result<bool> {
    let user = get_user_by_username(conn, username)?
        .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", username)))?;
    revoke_capability(conn, user.id, Capability::AuditHistoryRead)
}

pub fn user_has_capability(conn: &Connection, user_id: i64, capability: Capability) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM user_capabilities WHERE user_id = ?1 AND capability = ?2)",
        params![user_id, capability.as_ref()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

// ============ Audits ============

/// WHERE clause and bound values for an audit criteria. Absent filters add nothing.
fn audit_where_clause(criteria: &AuditCriteria) -> (String, Vec<Value>) {
    let mut where_clause = String::from("WHERE 1=1");
    let mut values: Vec<Value> = Vec::new();

    if let Some(range) = &criteria.logged_at {
        where_clause.push_str(" AND a.logged_at >= ? AND a.logged_at < ?");
        values.push(Value::Integer(range.start.timestamp()));
        values.push(Value::Integer(range.end.timestamp()));
    }
    if let Some(action) = criteria.action {
        where_clause.push_str(" AND a.action = ?");
        values.push(Value::Text(action.as_ref().to_string()));
    }
    if let Some(user) = &criteria.user {
        where_clause.push_str(" AND a.user_id = ?");
        values.push(Value::Integer(user.id));
    }
    if let Some(object_class) = &criteria.object_class {
        where_clause.push_str(" AND a.object_class = ?");
        values.push(Value::Text(object_class.clone()));
    }

    (where_clause, values)
}

/// One page of audits matching the criteria, newest first, plus the total match count.
pub fn query_audits(
    conn: &Connection,
    criteria: &AuditCriteria,
    paging: Paging,
) -> Result<(Vec<Audit>, i64)> {
    let (where_clause, mut values) = audit_where_clause(criteria);

    let count_sql = format!("SELECT COUNT(*) FROM {} {}", AUDIT_FROM, where_clause);
    let total: i64 = conn.query_row(&count_sql, params_from_iter(values.iter()), |row| row.get(0))?;

    let select_sql = format!(
        "SELECT {} FROM {} {} ORDER BY a.logged_at DESC, a.id DESC LIMIT ? OFFSET ?",
        AUDIT_COLS, AUDIT_FROM, where_clause
    );
    values.push(Value::Integer(paging.limit));
    values.push(Value::Integer(paging.offset()));

    let audits = query_all(conn, &select_sql, params_from_iter(values))?;
    Ok((audits, total))
}

pub fn get_audit_by_id(conn: &Connection, id: i64) -> Result<Option<Audit>> {
    query_one(
        conn,
        &format!("SELECT {} FROM {} WHERE a.id = ?1", AUDIT_COLS, AUDIT_FROM),
        [id],
    )
}

/// Create a user holding the audit read capability, with a fresh API key.
/// Used by the `bootstrap` command.
pub fn bootstrap_reader(conn: &mut Connection, input: &CreateUser) -> Result<(User, String)> {
    let tx = conn.transaction()?;
    if get_user_by_username(&tx, &input.username)?.is_some() {
        return Err(AppError::BadRequest(format!(
            "User '{}' already exists",
            input.username
        )));
    }
    let user = create_user(&tx, input)?;
    grant_capability(&tx, user.id, Capability::AuditHistoryRead)?;
    let (_key, raw) = create_api_key(&tx, user.id)?;
    tx.commit()?;
    Ok((user, raw))
}
