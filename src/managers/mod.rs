// marksmith state managers
// Managers own stateful objects: the bookmark tree, the staging copy, and the edit session tying them together.

pub mod bookmark_tree;
pub mod edit_session;
pub mod staging_store;
