use sqlx::{postgres::PgRow, FromRow, PgPool};
use uuid::Uuid;

use crate::config;
use crate::database::manager::DatabaseError;

/// 1-indexed page with a clamped limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub fn clamped(page: Option<i64>, limit: Option<i64>, default_limit: i64, max_limit: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, max_limit),
        }
    }

    /// Clamp against the configured limits.
    pub fn from_query(page: Option<i64>, limit: Option<i64>) -> Self {
        let api = &config::config().api;
        Self::clamped(page, limit, api.default_page_limit, api.max_page_limit)
    }

    pub fn offset(&self) -> i64 {
        // Saturate rather than overflow on absurd page numbers; a huge
        // OFFSET just yields an empty page.
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub search: Option<String>,
}

/// Escape LIKE metacharacters so a search term matches literally.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Tenant-scoped data access for one table.
///
/// Every read/update/delete carries `id = $n AND tenant_id = $m` as a single
/// predicate, so a cross-tenant id is indistinguishable from a row that does
/// not exist. Table and search-column names are compile-time constants; no
/// identifier ever comes from a request.
pub struct ScopedRepository<T> {
    table: &'static str,
    search_column: &'static str,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> ScopedRepository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table: &'static str, search_column: &'static str, pool: PgPool) -> Self {
        Self {
            table,
            search_column,
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn get(&self, id: Uuid, tenant_id: Uuid) -> Result<Option<T>, DatabaseError> {
        let sql = format!("SELECT * FROM {} WHERE id = $1 AND tenant_id = $2", self.table);
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Like `get`, but a miss (including a cross-tenant id) becomes NotFound.
    pub async fn get_404(&self, id: Uuid, tenant_id: Uuid) -> Result<T, DatabaseError> {
        self.get(id, tenant_id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Record not found".to_string()))
    }

    /// Page through the tenant's rows. The total is computed with the same
    /// scope predicate as the page itself so the two can never disagree.
    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &ListFilter,
        page: &Page,
    ) -> Result<(Vec<T>, i64), DatabaseError> {
        let (where_clause, pattern) = match &filter.search {
            Some(s) => (
                format!("tenant_id = $1 AND {} ILIKE $2", self.search_column),
                Some(format!("%{}%", escape_like(s))),
            ),
            None => ("tenant_id = $1".to_string(), None),
        };

        let count_sql = format!("SELECT COUNT(*) FROM {} WHERE {}", self.table, where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql).bind(tenant_id);
        if let Some(p) = &pattern {
            count_query = count_query.bind(p);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let (limit_param, offset_param) = match pattern {
            Some(_) => ("$3", "$4"),
            None => ("$2", "$3"),
        };
        let list_sql = format!(
            "SELECT * FROM {} WHERE {} ORDER BY created_at DESC, id LIMIT {} OFFSET {}",
            self.table, where_clause, limit_param, offset_param
        );
        let mut list_query = sqlx::query_as::<_, T>(&list_sql).bind(tenant_id);
        if let Some(p) = &pattern {
            list_query = list_query.bind(p);
        }
        let items = list_query.bind(page.limit).bind(page.offset()).fetch_all(&self.pool).await?;

        Ok((items, total))
    }

    /// Returns whether a row was deleted. A second delete of the same id is
    /// simply a miss, not an error.
    pub async fn delete(&self, id: Uuid, tenant_id: Uuid) -> Result<bool, DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE id = $1 AND tenant_id = $2", self.table);
        let result = sqlx::query(&sql).bind(id).bind(tenant_id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_clamping() {
        let page = Page::clamped(None, None, 25, 100);
        assert_eq!(page, Page { page: 1, limit: 25 });

        let page = Page::clamped(Some(0), Some(0), 25, 100);
        assert_eq!(page, Page { page: 1, limit: 1 });

        let page = Page::clamped(Some(-3), Some(5000), 25, 100);
        assert_eq!(page, Page { page: 1, limit: 100 });

        let page = Page::clamped(Some(4), Some(10), 25, 100);
        assert_eq!(page.offset(), 30);
    }

    #[test]
    fn offset_saturates_on_huge_page() {
        let page = Page::clamped(Some(i64::MAX), Some(100), 25, 100);
        assert_eq!(page.offset(), i64::MAX);

        let page = Page::clamped(Some(i64::MAX), None, 25, 100);
        assert!(page.offset() > 0);
    }

    #[test]
    fn search_metacharacters_match_literally() {
        assert_eq!(escape_like("acme"), "acme");
        assert_eq!(escape_like("100%_off"), "100\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
