// marksmith platform support for Linux
// Config:    ~/.config/marksmith
// Processes: /proc/<pid>/comm

use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Returns the configuration directory for marksmith on Linux.
/// Uses `$XDG_CONFIG_HOME/marksmith` if set, otherwise `~/.config/marksmith`.
pub fn get_config_dir() -> PathBuf {
    match env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join("marksmith"),
        _ => {
            let home = env::var("HOME").unwrap_or_else(|_| String::from("/tmp"));
            PathBuf::from(home).join(".config").join("marksmith")
        }
    }
}

/// Reads `comm` for every numeric entry in `/proc`. Processes that exit
/// during the scan are skipped.
pub fn running_process_names() -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir("/proc")? {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let is_pid = entry
            .file_name()
            .to_str()
            .map(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
            .unwrap_or(false);
        if !is_pid {
            continue;
        }
        if let Ok(comm) = fs::read_to_string(entry.path().join("comm")) {
            let comm = comm.trim();
            if !comm.is_empty() {
                names.push(comm.to_string());
            }
        }
    }
    Ok(names)
}
