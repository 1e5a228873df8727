//! The Firefox `places.sqlite` bookmark schema.
//!
//! marksmith never migrates an existing database. This module only creates
//! the subset of the schema it reads and writes, with the built-in root
//! folders, so fresh databases can be produced for tests and demos.

use rusqlite::{params, Connection};

/// GUID of the invisible root folder.
pub const ROOT_GUID: &str = "root________";
/// GUID of the bookmarks menu.
pub const MENU_GUID: &str = "menu________";
/// GUID of the bookmarks toolbar.
pub const TOOLBAR_GUID: &str = "toolbar_____";
/// GUID of the tags root.
pub const TAGS_GUID: &str = "tags________";
/// GUID of "Other Bookmarks".
pub const UNFILED_GUID: &str = "unfiled_____";
/// GUID of the mobile bookmarks root.
pub const MOBILE_GUID: &str = "mobile______";

/// Titles that identify the toolbar when it cannot be found by GUID.
pub const TOOLBAR_TITLES: [&str; 3] = ["Bookmarks Bar", "toolbar", "Bookmarks Toolbar"];

const CREATE_TABLES: &str = "
    CREATE TABLE IF NOT EXISTS moz_places (
        id INTEGER PRIMARY KEY,
        url LONGVARCHAR,
        title LONGVARCHAR,
        rev_host LONGVARCHAR,
        visit_count INTEGER DEFAULT 0,
        hidden INTEGER DEFAULT 0 NOT NULL,
        typed INTEGER DEFAULT 0 NOT NULL,
        frecency INTEGER DEFAULT -1 NOT NULL,
        last_visit_date INTEGER,
        guid TEXT,
        foreign_count INTEGER DEFAULT 0 NOT NULL,
        url_hash INTEGER DEFAULT 0 NOT NULL,
        description TEXT,
        preview_image_url TEXT,
        origin_id INTEGER
    );

    CREATE TABLE IF NOT EXISTS moz_bookmarks (
        id INTEGER PRIMARY KEY,
        type INTEGER,
        fk INTEGER DEFAULT NULL,
        parent INTEGER,
        position INTEGER,
        title LONGVARCHAR,
        keyword_id INTEGER,
        folder_type TEXT,
        dateAdded INTEGER,
        lastModified INTEGER,
        guid TEXT,
        syncStatus INTEGER NOT NULL DEFAULT 0,
        syncChangeCounter INTEGER NOT NULL DEFAULT 1
    );

    CREATE UNIQUE INDEX IF NOT EXISTS moz_places_guid_uniqueindex ON moz_places (guid);
    CREATE INDEX IF NOT EXISTS moz_places_url_hashindex ON moz_places (url_hash);
    CREATE UNIQUE INDEX IF NOT EXISTS moz_bookmarks_guid_uniqueindex ON moz_bookmarks (guid);
    CREATE INDEX IF NOT EXISTS moz_bookmarks_itemindex ON moz_bookmarks (fk, type);
    CREATE INDEX IF NOT EXISTS moz_bookmarks_parentindex ON moz_bookmarks (parent, position);
";

/// Built-in folders: (id, parent, position, title, guid).
const ROOTS: [(i64, i64, i64, &str, &str); 6] = [
    (1, 0, 0, "", ROOT_GUID),
    (2, 1, 0, "menu", MENU_GUID),
    (3, 1, 1, "toolbar", TOOLBAR_GUID),
    (4, 1, 2, "tags", TAGS_GUID),
    (5, 1, 3, "unfiled", UNFILED_GUID),
    (6, 1, 4, "mobile", MOBILE_GUID),
];

/// Creates the bookmark tables and seeds the root folders if they are missing.
///
/// # Errors
/// Returns `rusqlite::Error` if any SQL statement fails.
pub fn create_places_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(CREATE_TABLES)?;

    let seeded: i64 = conn.query_row(
        "SELECT COUNT(*) FROM moz_bookmarks WHERE guid = ?1",
        params![ROOT_GUID],
        |row| row.get(0),
    )?;
    if seeded > 0 {
        return Ok(());
    }

    for (id, parent, position, title, guid) in ROOTS {
        conn.execute(
            "INSERT INTO moz_bookmarks (id, type, fk, parent, position, title, dateAdded, lastModified, guid) \
             VALUES (?1, 2, NULL, ?2, ?3, ?4, 0, 0, ?5)",
            params![id, parent, position, title, guid],
        )?;
    }
    Ok(())
}

/// Creates a new `places.sqlite` file at `path` with the schema and roots.
///
/// # Errors
/// Returns `rusqlite::Error` if the file cannot be created or initialised.
pub fn create_places_database<P: AsRef<std::path::Path>>(path: P) -> Result<(), rusqlite::Error> {
    let conn = Connection::open(path)?;
    create_places_schema(&conn)?;
    conn.close().map_err(|(_, e)| e)
}
