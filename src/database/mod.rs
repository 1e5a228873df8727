//! marksmith database layer.
//!
//! Read-only access to a browser's `places.sqlite`, the shared row queries,
//! and the schema used to create fresh databases.
//!
//! # Usage
//!
//! ```no_run
//! use marksmith::database::Database;
//!
//! // Open a live profile database without locking it
//! let db = Database::open_read_only("places.sqlite").expect("failed to open database");
//! let tree = db.load_tree().expect("failed to load bookmarks");
//!
//! // Or use an in-memory database for testing
//! let db = Database::open_in_memory().expect("failed to open in-memory database");
//! ```

pub mod connection;
pub mod queries;
pub mod schema;

pub use connection::Database;
