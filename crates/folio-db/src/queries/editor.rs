//! Editor contract, attribution and income ledger queries.

use folio_types::records::EditorIncome;
use folio_types::{ChapterId, EditorAdminId, EditorRole, NovelId};
use rusqlite::{Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::{parse_decimal, Result};

/// An active editor contract on a novel.
#[derive(Debug)]
pub struct EditorContractRow {
    pub editor_admin_id: EditorAdminId,
    pub role: EditorRole,
    /// Percent of the book's income, on a 0–100 scale.
    pub share_percent: Decimal,
}

/// Insert an editor contract.
pub fn insert_contract(
    conn: &Connection,
    id: i64,
    novel_id: NovelId,
    editor_admin_id: EditorAdminId,
    role: EditorRole,
    share_percent: Decimal,
    status: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO novel_editor_contract
         (id, novel_id, editor_admin_id, role, share_percent, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            id,
            novel_id,
            editor_admin_id,
            role.as_str(),
            share_percent.to_string(),
            status,
        ],
    )?;
    Ok(())
}

/// Active contracts for a novel.
pub fn active_contracts(conn: &Connection, novel_id: NovelId) -> Result<Vec<EditorContractRow>> {
    let mut stmt = conn.prepare(
        "SELECT editor_admin_id, role, share_percent
         FROM novel_editor_contract
         WHERE novel_id = ?1 AND status = 'active'
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map([novel_id], |row| {
            Ok((
                row.get::<_, EditorAdminId>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(editor_admin_id, role, share)| {
            Ok(EditorContractRow {
                editor_admin_id,
                role: EditorRole::from_db(&role)
                    .ok_or_else(|| crate::DbError::Malformed(format!("role: {role:?}")))?,
                share_percent: parse_decimal("share_percent", &share)?,
            })
        })
        .collect()
}

/// Attribute a chapter to its responsible editor.
pub fn insert_chapter_attribution(
    conn: &Connection,
    novel_id: NovelId,
    chapter_id: ChapterId,
    editor_admin_id: EditorAdminId,
) -> Result<()> {
    conn.execute(
        "INSERT INTO editor_chapter_share (novel_id, chapter_id, editor_admin_id)
         VALUES (?1, ?2, ?3)",
        rusqlite::params![novel_id, chapter_id, editor_admin_id],
    )?;
    Ok(())
}

/// Released word count per attributed editor for a novel.
pub fn released_word_counts(
    conn: &Connection,
    novel_id: NovelId,
) -> Result<Vec<(EditorAdminId, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT s.editor_admin_id, COALESCE(SUM(c.word_count), 0)
         FROM editor_chapter_share s
         INNER JOIN chapter c ON c.id = s.chapter_id
         WHERE s.novel_id = ?1 AND c.is_released = 1
         GROUP BY s.editor_admin_id
         ORDER BY s.editor_admin_id",
    )?;
    let rows = stmt
        .query_map([novel_id], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Record a novel's monthly income aggregate of the given type.
pub fn insert_novel_income(
    conn: &Connection,
    novel_id: NovelId,
    month: &str,
    income_type: &str,
    income_usd: Decimal,
) -> Result<()> {
    conn.execute(
        "INSERT INTO novel_income_monthly (novel_id, month, income_type, income_usd)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![novel_id, month, income_type, income_usd.to_string()],
    )?;
    Ok(())
}

/// The novel's champion income for a month, if aggregated.
pub fn champion_income(conn: &Connection, novel_id: NovelId, month: &str) -> Result<Option<Decimal>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT income_usd FROM novel_income_monthly
             WHERE novel_id = ?1 AND month = ?2 AND income_type = 'champion'",
            rusqlite::params![novel_id, month],
            |row| row.get(0),
        )
        .optional()?;
    raw.map(|s| parse_decimal("income_usd", &s)).transpose()
}

/// Accumulate an editor's share into the monthly income ledger.
///
/// Creates the row if absent, otherwise adds to the existing totals —
/// re-running a novel in the same month augments rather than conflicts.
pub fn upsert_income(
    conn: &Connection,
    editor_admin_id: EditorAdminId,
    novel_id: NovelId,
    month: &str,
    gross_book_income_usd: Decimal,
    editor_income_usd: Decimal,
) -> Result<()> {
    let existing = income_row(conn, editor_admin_id, novel_id, month)?;
    match existing {
        Some(row) => {
            conn.execute(
                "UPDATE editor_income_monthly
                 SET gross_book_income_usd = ?4, editor_income_usd = ?5
                 WHERE editor_admin_id = ?1 AND novel_id = ?2 AND month = ?3",
                rusqlite::params![
                    editor_admin_id,
                    novel_id,
                    month,
                    (row.gross_book_income_usd + gross_book_income_usd).to_string(),
                    (row.editor_income_usd + editor_income_usd).to_string(),
                ],
            )?;
        }
        None => {
            conn.execute(
                "INSERT INTO editor_income_monthly
                 (editor_admin_id, novel_id, month, gross_book_income_usd, editor_income_usd)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    editor_admin_id,
                    novel_id,
                    month,
                    gross_book_income_usd.to_string(),
                    editor_income_usd.to_string(),
                ],
            )?;
        }
    }
    Ok(())
}

/// One editor's income ledger row for a novel and month.
pub fn income_row(
    conn: &Connection,
    editor_admin_id: EditorAdminId,
    novel_id: NovelId,
    month: &str,
) -> Result<Option<EditorIncome>> {
    let row = conn
        .query_row(
            "SELECT editor_admin_id, novel_id, month, gross_book_income_usd, editor_income_usd
             FROM editor_income_monthly
             WHERE editor_admin_id = ?1 AND novel_id = ?2 AND month = ?3",
            rusqlite::params![editor_admin_id, novel_id, month],
            |row| {
                Ok((
                    row.get::<_, EditorAdminId>(0)?,
                    row.get::<_, NovelId>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        )
        .optional()?;

    row.map(|(editor_admin_id, novel_id, month, gross, income)| {
        Ok(EditorIncome {
            editor_admin_id,
            novel_id,
            month,
            gross_book_income_usd: parse_decimal("gross_book_income_usd", &gross)?,
            editor_income_usd: parse_decimal("editor_income_usd", &income)?,
        })
    })
    .transpose()
}
