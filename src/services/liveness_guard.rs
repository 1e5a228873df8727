//! Liveness Guard for marksmith.
//!
//! Answers one question before a commit: is a browser that owns the source
//! database running right now?

use tracing::{debug, warn};

use crate::platform;
use crate::types::settings::{LivenessSettings, ProcessMatcher};

/// Reports whether the owner of the source database is running.
pub trait LivenessGuard {
    /// Display name of a running owner process, or `None` if none is running.
    fn owner_running(&self) -> Option<String>;
}

/// Scans the OS process list for configured browser executables.
#[derive(Debug, Clone)]
pub struct ProcessScanGuard {
    matchers: Vec<ProcessMatcher>,
}

impl ProcessScanGuard {
    pub fn new(matchers: Vec<ProcessMatcher>) -> Self {
        Self { matchers }
    }

    pub fn from_settings(settings: &LivenessSettings) -> Self {
        Self::new(settings.processes.clone())
    }

    /// Returns the display name of the first matcher, in configuration order,
    /// whose executable appears in `names`.
    pub fn match_processes<S: AsRef<str>>(&self, names: &[S]) -> Option<String> {
        let running: Vec<String> = names.iter().map(|n| normalize(n.as_ref())).collect();
        self.matchers
            .iter()
            .find(|m| {
                let wanted = normalize(&m.executable);
                running.iter().any(|r| *r == wanted)
            })
            .map(|m| m.display_name.clone())
    }
}

impl LivenessGuard for ProcessScanGuard {
    fn owner_running(&self) -> Option<String> {
        match platform::running_process_names() {
            Ok(names) => {
                let found = self.match_processes(&names);
                debug!(processes = names.len(), owner = ?found, "process scan finished");
                found
            }
            Err(e) => {
                // An unreadable process list is not proof that the browser is running.
                warn!(error = %e, "could not list running processes");
                None
            }
        }
    }
}

/// Basename, trimmed and lowercased, without a trailing `.exe`.
fn normalize(name: &str) -> String {
    let base = name.trim().rsplit(['/', '\\']).next().unwrap_or_default();
    let lower = base.to_lowercase();
    match lower.strip_suffix(".exe") {
        Some(stem) => stem.to_string(),
        None => lower,
    }
}

/// A guard with a fixed answer, for tests and `--force`-style callers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedGuard(pub Option<String>);

impl FixedGuard {
    pub fn running(name: &str) -> Self {
        Self(Some(name.to_string()))
    }

    pub fn idle() -> Self {
        Self(None)
    }
}

impl LivenessGuard for FixedGuard {
    fn owner_running(&self) -> Option<String> {
        self.0.clone()
    }
}
