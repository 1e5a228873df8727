//! Row-level reads shared by the read-only loader and the staging store.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::types::bookmark::BookmarkRow;

const SELECT_ROWS: &str = "
    SELECT b.id, b.type, b.fk, b.parent, b.position, b.title,
           COALESCE(b.dateAdded, 0), COALESCE(b.lastModified, 0), COALESCE(b.guid, ''),
           p.url, COALESCE(p.visit_count, 0)
    FROM moz_bookmarks b
    LEFT JOIN moz_places p ON b.fk = p.id";

/// Maps one row of [`SELECT_ROWS`] into a [`BookmarkRow`].
pub fn row_to_bookmark(row: &Row) -> rusqlite::Result<BookmarkRow> {
    Ok(BookmarkRow {
        id: row.get(0)?,
        kind_code: row.get(1)?,
        fk: row.get(2)?,
        parent: row.get(3)?,
        position: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
        title: row.get(5)?,
        date_added: row.get(6)?,
        last_modified: row.get(7)?,
        guid: row.get(8)?,
        url: row.get(9)?,
        visit_count: row.get(10)?,
    })
}

/// Reads every bookmark row ordered by parent, then position.
pub fn fetch_all_rows(conn: &Connection) -> rusqlite::Result<Vec<BookmarkRow>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY b.parent, b.position, b.id", SELECT_ROWS))?;
    let rows = stmt.query_map([], row_to_bookmark)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Reads a single bookmark row by id.
pub fn fetch_row(conn: &Connection, id: i64) -> rusqlite::Result<Option<BookmarkRow>> {
    conn.query_row(
        &format!("{} WHERE b.id = ?1", SELECT_ROWS),
        params![id],
        row_to_bookmark,
    )
    .optional()
}

/// Reads bookmark rows whose place URL is shared by more than one bookmark,
/// ordered by URL then id.
pub fn fetch_duplicate_rows(conn: &Connection) -> rusqlite::Result<Vec<BookmarkRow>> {
    let sql = format!(
        "{} WHERE b.type = 1 AND p.url IN (
            SELECT p2.url FROM moz_bookmarks b2
            JOIN moz_places p2 ON b2.fk = p2.id
            WHERE b2.type = 1
            GROUP BY p2.url
            HAVING COUNT(b2.id) > 1
         )
         ORDER BY p.url, b.id",
        SELECT_ROWS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], row_to_bookmark)?;
    rows.collect()
}
