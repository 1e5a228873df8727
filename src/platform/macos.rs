// marksmith platform support for macOS
// Config:    ~/Library/Application Support/marksmith
// Processes: `ps -A -c -o comm=`

use std::env;
use std::io;
use std::path::PathBuf;
use std::process::Command;

/// Returns the configuration directory for marksmith on macOS.
/// `~/Library/Application Support/marksmith`
pub fn get_config_dir() -> PathBuf {
    let home = env::var("HOME").unwrap_or_else(|_| String::from("/tmp"));
    PathBuf::from(home)
        .join("Library")
        .join("Application Support")
        .join("marksmith")
}

/// Lists process names through `ps`.
pub fn running_process_names() -> io::Result<Vec<String>> {
    let output = Command::new("ps").args(["-A", "-c", "-o", "comm="]).output()?;
    if !output.status.success() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("ps exited with {}", output.status),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}
