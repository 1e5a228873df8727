// marksmith platform abstraction
// Provides the settings directory, the home directory and a process listing
// for Windows, macOS, and Linux.
//
// Uses `cfg(target_os)` for conditional compilation to select the correct
// platform-specific implementation at compile time.

use std::io;
use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Returns the platform-specific configuration directory for marksmith.
///
/// - **Linux**: `~/.config/marksmith` (or `$XDG_CONFIG_HOME/marksmith`)
/// - **macOS**: `~/Library/Application Support/marksmith`
/// - **Windows**: `%APPDATA%/marksmith`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// The current user's home directory, if the environment names one.
pub fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let var = "USERPROFILE";
    #[cfg(not(target_os = "windows"))]
    let var = "HOME";

    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Executable names of the processes currently running.
///
/// Names may carry a directory or an `.exe` suffix depending on the
/// platform; callers normalise them.
pub fn running_process_names() -> io::Result<Vec<String>> {
    #[cfg(target_os = "linux")]
    {
        linux::running_process_names()
    }
    #[cfg(target_os = "macos")]
    {
        macos::running_process_names()
    }
    #[cfg(target_os = "windows")]
    {
        windows::running_process_names()
    }
}
