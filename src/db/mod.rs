mod from_row;
pub mod queries;

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::config::PagingConfig;
use crate::services::{
    ActorResolver, AuditManager, Authorizer, EntityClassResolver, NamespaceClassResolver,
    SqliteActorResolver, SqliteAuditManager, SqliteAuthorizer,
};

pub type DbPool = Pool<SqliteConnectionManager>;

/// Shared handler state. Collaborators are injected as trait objects so the
/// handlers never reach for a concrete storage type.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub authorizer: Arc<dyn Authorizer>,
    pub audits: Arc<AuditManager>,
    pub actors: Arc<dyn ActorResolver>,
    pub entity_classes: Arc<dyn EntityClassResolver>,
    pub paging: PagingConfig,
}

impl AppState {
    /// State with every collaborator backed by the given SQLite pool.
    pub fn new(db: DbPool, paging: PagingConfig) -> Self {
        Self {
            authorizer: Arc::new(SqliteAuthorizer::new(db.clone())),
            audits: Arc::new(SqliteAuditManager::new(db.clone())),
            actors: Arc::new(SqliteActorResolver::new(db.clone())),
            entity_classes: Arc::new(NamespaceClassResolver::default()),
            db,
            paging,
        }
    }
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
    Pool::builder().max_size(10).build(manager)
}

pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS api_keys (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            prefix TEXT NOT NULL,
            key_hash TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL,
            revoked_at INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_api_keys_user ON api_keys(user_id);

        CREATE TABLE IF NOT EXISTS user_capabilities (
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            capability TEXT NOT NULL,
            granted_at INTEGER NOT NULL,
            PRIMARY KEY (user_id, capability)
        );

        -- Written by the auditing subsystem; this service only reads it
        CREATE TABLE IF NOT EXISTS audits (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            action TEXT NOT NULL CHECK (action IN ('create', 'update', 'remove')),
            logged_at INTEGER NOT NULL,
            object_id TEXT,
            object_class TEXT NOT NULL,
            object_name TEXT,
            version INTEGER,
            user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
            data TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_audits_logged_at ON audits(logged_at DESC, id DESC);
        CREATE INDEX IF NOT EXISTS idx_audits_object_class ON audits(object_class);
        CREATE INDEX IF NOT EXISTS idx_audits_user ON audits(user_id);
        "#,
    )
}
