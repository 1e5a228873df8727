// marksmith shared type definitions
// Each submodule defines types used across the crate.

pub mod audit;
pub mod bookmark;
pub mod errors;
pub mod profile;
pub mod settings;
