// marksmith platform support for Windows
// Config:    %APPDATA%/marksmith
// Processes: `tasklist /FO CSV /NH`

use std::env;
use std::io;
use std::path::PathBuf;
use std::process::Command;

/// Returns the configuration directory for marksmith on Windows.
/// `%APPDATA%/marksmith`
pub fn get_config_dir() -> PathBuf {
    let appdata =
        env::var("APPDATA").unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Roaming"));
    PathBuf::from(appdata).join("marksmith")
}

/// Lists image names through `tasklist`.
pub fn running_process_names() -> io::Result<Vec<String>> {
    let output = Command::new("tasklist").args(["/FO", "CSV", "/NH"]).output()?;
    if !output.status.success() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("tasklist exited with {}", output.status),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter_map(image_name)
        .collect())
}

/// First CSV column of a `tasklist` row: `"firefox.exe","1234",...`.
fn image_name(line: &str) -> Option<String> {
    let rest = line.trim().strip_prefix('"')?;
    let end = rest.find('"')?;
    let name = &rest[..end];
    (!name.is_empty()).then(|| name.to_string())
}
