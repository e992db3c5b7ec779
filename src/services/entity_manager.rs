use crate::criteria::AuditCriteria;
use crate::db::{DbPool, queries};
use crate::error::Result;
use crate::models::Audit;
use crate::pagination::Paging;

/// Read access to one entity type: paged criteria queries and lookup by id.
pub trait EntityManager: Send + Sync {
    type Entity;
    type Criteria;

    /// Human-readable entity name used in error messages.
    fn entity_name(&self) -> &'static str;

    /// One page of matching entities and the total number of matches.
    fn find_page(
        &self,
        criteria: &Self::Criteria,
        paging: Paging,
    ) -> Result<(Vec<Self::Entity>, i64)>;

    fn find(&self, id: i64) -> Result<Option<Self::Entity>>;
}

pub type AuditManager = dyn EntityManager<Entity = Audit, Criteria = AuditCriteria>;

pub struct SqliteAuditManager {
    pool: DbPool,
}

impl SqliteAuditManager {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl EntityManager for SqliteAuditManager {
    type Entity = Audit;
    type Criteria = AuditCriteria;

    fn entity_name(&self) -> &'static str {
        "Audit"
    }

    fn find_page(&self, criteria: &AuditCriteria, paging: Paging) -> Result<(Vec<Audit>, i64)> {
        let conn = self.pool.get()?;
        queries::query_audits(&conn, criteria, paging)
    }

    fn find(&self, id: i64) -> Result<Option<Audit>> {
        let conn = self.pool.get()?;
        queries::get_audit_by_id(&conn, id)
    }
}
