//! Explicit example matching for repository queries
//!
//! Filters are declared with explicit column names and field accessors
//! rather than reflection. An [`Example`] both compiles to a SQL WHERE
//! fragment and evaluates in memory, so mock repositories share the same
//! filter semantics as SQL-backed ones.

use sqlx::{Postgres, QueryBuilder};

/// One matching rule applied to a column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Match {
    Eq(String),
    Contains(String),
    StartsWith(String),
}

struct Predicate<T> {
    column: &'static str,
    get: fn(&T) -> String,
    matcher: Match,
}

/// A set of predicates an entity must satisfy, all of them
pub struct Example<T> {
    predicates: Vec<Predicate<T>>,
}

impl<T> Default for Example<T> {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }
}

impl<T> Example<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn eq(
        mut self,
        column: &'static str,
        get: fn(&T) -> String,
        value: impl Into<String>,
    ) -> Self {
        self.predicates.push(Predicate {
            column,
            get,
            matcher: Match::Eq(value.into()),
        });
        self
    }

    pub fn contains(
        mut self,
        column: &'static str,
        get: fn(&T) -> String,
        value: impl Into<String>,
    ) -> Self {
        self.predicates.push(Predicate {
            column,
            get,
            matcher: Match::Contains(value.into()),
        });
        self
    }

    pub fn starts_with(
        mut self,
        column: &'static str,
        get: fn(&T) -> String,
        value: impl Into<String>,
    ) -> Self {
        self.predicates.push(Predicate {
            column,
            get,
            matcher: Match::StartsWith(value.into()),
        });
        self
    }

    /// Evaluate the example against one entity in memory
    pub fn matches(&self, entity: &T) -> bool {
        self.predicates.iter().all(|p| {
            let actual = (p.get)(entity);
            match &p.matcher {
                Match::Eq(v) => &actual == v,
                Match::Contains(v) => actual.contains(v.as_str()),
                Match::StartsWith(v) => actual.starts_with(v.as_str()),
            }
        })
    }

    /// Append a `WHERE`/`AND` fragment per predicate; values are bound,
    /// column names come from the static declarations above
    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        for (i, p) in self.predicates.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            qb.push(p.column);
            match &p.matcher {
                Match::Eq(v) => {
                    qb.push(" = ");
                    qb.push_bind(v.clone());
                }
                Match::Contains(v) => {
                    qb.push(" LIKE ");
                    qb.push_bind(format!("%{}%", escape_like(v)));
                }
                Match::StartsWith(v) => {
                    qb.push(" LIKE ");
                    qb.push_bind(format!("{}%", escape_like(v)));
                }
            }
        }
    }
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
