//! Novel & chapter catalog queries.

use folio_types::{ChapterId, NovelId, UserId};
use rusqlite::{Connection, OptionalExtension};

use crate::Result;

/// A catalog novel row.
#[derive(Debug)]
pub struct NovelRow {
    pub id: NovelId,
    /// Novels imported without a signed author may have none.
    pub author_id: Option<UserId>,
    pub title: String,
}

/// Insert a novel.
pub fn insert_novel(
    conn: &Connection,
    id: NovelId,
    author_id: Option<UserId>,
    title: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO novel (id, author_id, title) VALUES (?1, ?2, ?3)",
        rusqlite::params![id, author_id, title],
    )?;
    Ok(())
}

/// Insert a chapter.
pub fn insert_chapter(
    conn: &Connection,
    id: ChapterId,
    novel_id: NovelId,
    word_count: i64,
    is_released: bool,
) -> Result<()> {
    conn.execute(
        "INSERT INTO chapter (id, novel_id, word_count, is_released) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![id, novel_id, word_count, is_released as i64],
    )?;
    Ok(())
}

/// Look up a novel by id.
pub fn novel(conn: &Connection, id: NovelId) -> Result<Option<NovelRow>> {
    let row = conn
        .query_row(
            "SELECT id, author_id, title FROM novel WHERE id = ?1",
            [id],
            |row| {
                Ok(NovelRow {
                    id: row.get(0)?,
                    author_id: row.get(1)?,
                    title: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_novel_round_trip() {
        let conn = crate::open_memory().expect("open");
        insert_novel(&conn, 1, Some(42), "Sword of Dawn").expect("insert");

        let row = novel(&conn, 1).expect("query").expect("exists");
        assert_eq!(row.author_id, Some(42));
        assert_eq!(row.title, "Sword of Dawn");
        assert!(novel(&conn, 2).expect("query").is_none());
    }

    #[test]
    fn test_authorless_novel() {
        let conn = crate::open_memory().expect("open");
        insert_novel(&conn, 5, None, "Orphaned Import").expect("insert");
        let row = novel(&conn, 5).expect("query").expect("exists");
        assert_eq!(row.author_id, None);
    }
}
