//! Locates Firefox and LibreWolf profiles that hold a `places.sqlite`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::types::errors::ProfileError;
use crate::types::profile::Profile;

/// Profile roots relative to the home directory, LibreWolf first.
const BROWSER_DIRS: &[(&str, &[&str])] = &[
    ("LibreWolf", &[".librewolf"]),
    ("Firefox", &[".mozilla", "firefox"]),
    ("LibreWolf", &["Library", "Application Support", "LibreWolf"]),
    ("Firefox", &["Library", "Application Support", "Firefox"]),
    ("LibreWolf", &["AppData", "Roaming", "LibreWolf"]),
    ("Firefox", &["AppData", "Roaming", "Mozilla", "Firefox"]),
];

/// One `[ProfileN]` section of `profiles.ini`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniProfile {
    pub name: String,
    pub path: String,
    pub is_relative: bool,
    pub is_default: bool,
}

/// Parses `profiles.ini`.
///
/// Sections without both `Name` and `Path` are skipped. A profile is the
/// default if its section says `Default=1` or an `[Install…]` section names
/// its path.
pub fn parse_profiles_ini(content: &str) -> Vec<IniProfile> {
    let mut profiles = Vec::new();
    let mut install_defaults = Vec::new();
    let mut current: Option<IniProfile> = None;
    let mut in_install = false;

    let flush = |current: &mut Option<IniProfile>, profiles: &mut Vec<IniProfile>| {
        if let Some(p) = current.take() {
            if !p.name.is_empty() && !p.path.is_empty() {
                profiles.push(p);
            }
        }
    };

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            flush(&mut current, &mut profiles);
            let section = &line[1..line.len() - 1];
            in_install = section.starts_with("Install");
            if section.starts_with("Profile") {
                current = Some(IniProfile {
                    name: String::new(),
                    path: String::new(),
                    is_relative: true,
                    is_default: false,
                });
            }
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());

        if in_install {
            if key == "Default" {
                install_defaults.push(value.to_string());
            }
            continue;
        }
        if let Some(p) = current.as_mut() {
            match key {
                "Name" => p.name = value.to_string(),
                "Path" => p.path = value.to_string(),
                "IsRelative" => p.is_relative = value != "0",
                "Default" => p.is_default = value == "1",
                _ => {}
            }
        }
    }
    flush(&mut current, &mut profiles);

    for p in &mut profiles {
        if install_defaults.iter().any(|d| *d == p.path) {
            p.is_default = true;
        }
    }
    profiles
}

/// Finds every profile with a bookmark database under the known browser
/// roots in `home`.
///
/// # Errors
/// - `NoBrowserDir` when none of the roots exist.
/// - `MissingProfilesIni` when roots exist but none has a `profiles.ini`.
/// - `NoProfiles` when no listed profile has a `places.sqlite`.
pub fn discover_profiles(home: &Path) -> Result<Vec<Profile>, ProfileError> {
    let mut roots_found = Vec::new();
    let mut any_ini = false;
    let mut profiles = Vec::new();

    for (browser, parts) in BROWSER_DIRS {
        let root = parts.iter().fold(home.to_path_buf(), |p, part| p.join(part));
        if !root.is_dir() {
            continue;
        }
        debug!(browser, root = %root.display(), "found browser profile directory");
        roots_found.push(root.clone());

        let ini = root.join("profiles.ini");
        if !ini.is_file() {
            continue;
        }
        any_ini = true;
        let content = fs::read_to_string(&ini)
            .map_err(|e| ProfileError::Io(format!("{}: {}", ini.display(), e)))?;

        for entry in parse_profiles_ini(&content) {
            let dir = if entry.is_relative {
                root.join(&entry.path)
            } else {
                PathBuf::from(&entry.path)
            };
            let places = dir.join("places.sqlite");
            if places.is_file() {
                profiles.push(Profile {
                    browser: browser.to_string(),
                    name: entry.name,
                    places_path: places,
                    is_default: entry.is_default,
                });
            } else {
                debug!(profile = %entry.name, "profile has no places.sqlite, skipping");
            }
        }
    }

    match roots_found.first() {
        None => Err(ProfileError::NoBrowserDir),
        Some(first) if !any_ini => Err(ProfileError::MissingProfilesIni(
            first.join("profiles.ini").display().to_string(),
        )),
        Some(_) if profiles.is_empty() => Err(ProfileError::NoProfiles),
        Some(_) => Ok(profiles),
    }
}

/// Picks a profile by name (case-insensitive), or the default one when
/// `name` is `None`. Falls back to the first profile when none is marked default.
pub fn select_profile<'a>(profiles: &'a [Profile], name: Option<&str>) -> Option<&'a Profile> {
    match name {
        Some(name) => profiles.iter().find(|p| p.name.eq_ignore_ascii_case(name)),
        None => profiles
            .iter()
            .find(|p| p.is_default)
            .or_else(|| profiles.first()),
    }
}
