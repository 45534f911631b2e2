//! The trust boundary between model output and the database.
//!
//! Generated SQL is untrusted. [`AllowAll`] forwards it untouched, which is
//! the default; [`ReadOnlyGuard`] is opt-in and only lets read statements
//! through.

use crate::error::{Result, SqlChatError};
use sqlparser::ast::{Query, SetExpr, Statement};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

pub trait SqlGuard: Send + Sync {
    fn check(&self, sql: &str) -> Result<()>;

    fn name(&self) -> &str;
}

pub struct AllowAll;

impl SqlGuard for AllowAll {
    fn check(&self, _sql: &str) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "allow-all"
    }
}

/// Accepts only `SELECT`-style queries and `EXPLAIN` of them. Text that
/// does not parse as PostgreSQL is rejected, as are `SELECT ... INTO` and
/// locking clauses such as `FOR UPDATE`.
pub struct ReadOnlyGuard;

impl ReadOnlyGuard {
    fn reject(&self, reason: impl Into<String>) -> SqlChatError {
        SqlChatError::Rejected {
            guard: self.name().to_string(),
            reason: reason.into(),
        }
    }

    fn is_read_only(statement: &Statement) -> bool {
        match statement {
            Statement::Query(query) => Self::query_is_read_only(query),
            Statement::Explain { statement, .. } => Self::is_read_only(statement),
            _ => false,
        }
    }

    fn query_is_read_only(query: &Query) -> bool {
        if !query.locks.is_empty() {
            return false;
        }
        let ctes_read_only = query.with.as_ref().map_or(true, |with| {
            with.cte_tables
                .iter()
                .all(|cte| Self::query_is_read_only(&cte.query))
        });
        ctes_read_only && Self::body_is_read_only(&query.body)
    }

    fn body_is_read_only(body: &SetExpr) -> bool {
        match body {
            SetExpr::Select(select) => select.into.is_none(),
            SetExpr::Query(query) => Self::query_is_read_only(query),
            SetExpr::SetOperation { left, right, .. } => {
                Self::body_is_read_only(left) && Self::body_is_read_only(right)
            }
            SetExpr::Values(_) | SetExpr::Table(_) => true,
            _ => false,
        }
    }
}

impl SqlGuard for ReadOnlyGuard {
    fn check(&self, sql: &str) -> Result<()> {
        let statements = Parser::parse_sql(&PostgreSqlDialect {}, sql)
            .map_err(|e| self.reject(format!("could not parse statement: {}", e)))?;

        if statements.is_empty() {
            return Err(self.reject("no statement to run"));
        }

        match statements.iter().find(|s| !Self::is_read_only(s)) {
            Some(statement) => {
                let text = statement.to_string();
                let keyword = text.split_whitespace().next().unwrap_or("statement");
                Err(self.reject(format!("{} is not a read-only statement", keyword)))
            }
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "read-only guard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all_accepts_anything() {
        assert!(AllowAll.check("DROP TABLE \"orders\"").is_ok());
        assert!(AllowAll.check("SELEC * FORM t").is_ok());
    }

    #[test]
    fn test_read_only_accepts_queries() {
        let guard = ReadOnlyGuard;
        assert!(guard.check("SELECT * FROM \"orders\" WHERE \"id\" = 1;").is_ok());
        assert!(guard
            .check("WITH t AS (SELECT 1 AS x) SELECT x FROM t")
            .is_ok());
        assert!(guard.check("EXPLAIN SELECT 1").is_ok());
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let guard = ReadOnlyGuard;
        let err = guard.check("UPDATE \"orders\" SET \"amount\" = 0").unwrap_err();
        assert!(err.to_string().contains("UPDATE"));
        assert!(guard.check("SELECT 1; DELETE FROM \"orders\"").is_err());
        assert!(guard.check("EXPLAIN ANALYZE DELETE FROM \"orders\"").is_err());
    }

    #[test]
    fn test_read_only_rejects_select_into_and_locks() {
        let guard = ReadOnlyGuard;
        assert!(guard
            .check("SELECT * INTO \"stolen\" FROM \"orders\"")
            .is_err());
        assert!(guard
            .check("SELECT 1 UNION SELECT \"id\" INTO \"copy\" FROM \"orders\"")
            .is_err());
        assert!(guard
            .check("SELECT * FROM \"orders\" WHERE \"id\" = 1 FOR UPDATE")
            .is_err());
        assert!(guard
            .check("WITH t AS (SELECT \"id\" FROM \"orders\" FOR SHARE) SELECT * FROM t")
            .is_err());
        assert!(guard.check("SELECT 1 UNION ALL SELECT 2").is_ok());
    }

    #[test]
    fn test_read_only_rejects_unparseable_and_empty() {
        let guard = ReadOnlyGuard;
        assert!(matches!(
            guard.check("SELEC * FORM t"),
            Err(SqlChatError::Rejected { .. })
        ));
        assert!(guard.check("").is_err());
    }
}
