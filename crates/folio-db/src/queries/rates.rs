//! Karma→USD rate table queries.

use rusqlite::{Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::{parse_decimal, Result};

/// Insert a rate row. `effective_to = None` leaves the window open-ended.
pub fn insert_rate(
    conn: &Connection,
    usd_per_karma: Decimal,
    effective_from: i64,
    effective_to: Option<i64>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO karma_rate (usd_per_karma, effective_from, effective_to)
         VALUES (?1, ?2, ?3)",
        rusqlite::params![usd_per_karma.to_string(), effective_from, effective_to],
    )?;
    Ok(())
}

/// Rate in force at the given instant: newest `effective_from` whose half-open
/// window covers it. `None` when the table has no covering row.
pub fn rate_at(conn: &Connection, instant: i64) -> Result<Option<Decimal>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT usd_per_karma FROM karma_rate
             WHERE effective_from <= ?1 AND (effective_to IS NULL OR effective_to > ?1)
             ORDER BY effective_from DESC
             LIMIT 1",
            [instant],
            |row| row.get(0),
        )
        .optional()?;

    raw.map(|s| parse_decimal("usd_per_karma", &s)).transpose()
}
