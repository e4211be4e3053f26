//! Sort and pagination rendering for `sqlx::QueryBuilder`
//!
//! Sort fields pass through an identifier allow-list; anything not listed
//! is silently dropped, so client-supplied sort parameters can never reach
//! the SQL text.

use gantry_common::pagination::{Direction, PageRequest, SortKey};
use sqlx::{Postgres, QueryBuilder};

/// Append an `ORDER BY` clause for the allow-listed sort keys, in order
pub fn push_order_by(qb: &mut QueryBuilder<'_, Postgres>, sort: &[SortKey], allowed: &[&str]) {
    let mut first = true;
    for key in sort {
        if !allowed.contains(&key.field.as_str()) {
            tracing::debug!(field = %key.field, "dropping sort key not in allow-list");
            continue;
        }
        qb.push(if first { " ORDER BY " } else { ", " });
        qb.push(key.field.as_str());
        if key.direction == Direction::Desc {
            qb.push(" DESC");
        }
        first = false;
    }
}

/// Append bound `LIMIT`/`OFFSET` clauses
pub fn push_page(qb: &mut QueryBuilder<'_, Postgres>, page: &PageRequest) {
    qb.push(" LIMIT ");
    qb.push_bind(page.limit);
    qb.push(" OFFSET ");
    qb.push_bind(page.offset);
}
