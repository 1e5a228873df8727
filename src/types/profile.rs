use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A browser profile that has a bookmark database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub browser: String,
    pub name: String,
    pub places_path: PathBuf,
    pub is_default: bool,
}
