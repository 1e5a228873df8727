//! Unit tests for browser profile discovery against fake home directories.

use std::fs;
use std::path::Path;

use marksmith::services::profile_discovery::{discover_profiles, select_profile};
use marksmith::types::errors::ProfileError;

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"").unwrap();
}

fn firefox_home() -> tempfile::TempDir {
    let home = tempfile::tempdir().unwrap();
    let root = home.path().join(".mozilla").join("firefox");
    fs::create_dir_all(&root).unwrap();
    fs::write(
        root.join("profiles.ini"),
        "[Profile0]\nName=default-release\nIsRelative=1\nPath=abcd.default-release\n\n\
         [Profile1]\nName=empty\nIsRelative=1\nPath=efgh.empty\n\n\
         [Install4F96D1932A9F858E]\nDefault=abcd.default-release\n",
    )
    .unwrap();
    touch(&root.join("abcd.default-release").join("places.sqlite"));
    fs::create_dir_all(root.join("efgh.empty")).unwrap();
    home
}

#[test]
fn test_discovers_profiles_with_places() {
    let home = firefox_home();
    let profiles = discover_profiles(home.path()).unwrap();

    assert_eq!(profiles.len(), 1);
    let p = &profiles[0];
    assert_eq!(p.browser, "Firefox");
    assert_eq!(p.name, "default-release");
    assert!(p.is_default);
    assert!(p.places_path.ends_with("abcd.default-release/places.sqlite"));
}

#[test]
fn test_librewolf_and_firefox_both_listed() {
    let home = firefox_home();
    let lw = home.path().join(".librewolf");
    fs::create_dir_all(&lw).unwrap();
    fs::write(lw.join("profiles.ini"), "[Profile0]\nName=wolf\nPath=w.default\n").unwrap();
    touch(&lw.join("w.default").join("places.sqlite"));

    let profiles = discover_profiles(home.path()).unwrap();
    let names: Vec<(&str, &str)> = profiles
        .iter()
        .map(|p| (p.browser.as_str(), p.name.as_str()))
        .collect();
    assert_eq!(names, vec![("LibreWolf", "wolf"), ("Firefox", "default-release")]);
}

#[test]
fn test_absolute_profile_path() {
    let home = tempfile::tempdir().unwrap();
    let elsewhere = tempfile::tempdir().unwrap();
    touch(&elsewhere.path().join("places.sqlite"));
    let root = home.path().join(".librewolf");
    fs::create_dir_all(&root).unwrap();
    fs::write(
        root.join("profiles.ini"),
        format!("[Profile0]\nName=abs\nIsRelative=0\nPath={}\n", elsewhere.path().display()),
    )
    .unwrap();

    let profiles = discover_profiles(home.path()).unwrap();
    assert_eq!(profiles[0].places_path, elsewhere.path().join("places.sqlite"));
}

#[test]
fn test_no_browser_dir() {
    let home = tempfile::tempdir().unwrap();
    assert!(matches!(discover_profiles(home.path()), Err(ProfileError::NoBrowserDir)));
}

#[test]
fn test_missing_profiles_ini() {
    let home = tempfile::tempdir().unwrap();
    fs::create_dir_all(home.path().join(".librewolf")).unwrap();
    assert!(matches!(
        discover_profiles(home.path()),
        Err(ProfileError::MissingProfilesIni(_))
    ));
}

#[test]
fn test_no_profile_has_places() {
    let home = tempfile::tempdir().unwrap();
    let root = home.path().join(".librewolf");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("profiles.ini"), "[Profile0]\nName=a\nPath=a\n").unwrap();
    assert!(matches!(discover_profiles(home.path()), Err(ProfileError::NoProfiles)));
}

#[test]
fn test_select_profile() {
    let home = firefox_home();
    let profiles = discover_profiles(home.path()).unwrap();

    assert_eq!(select_profile(&profiles, None).unwrap().name, "default-release");
    assert_eq!(
        select_profile(&profiles, Some("DEFAULT-RELEASE")).unwrap().name,
        "default-release"
    );
    assert!(select_profile(&profiles, Some("missing")).is_none());
    assert!(select_profile(&[], None).is_none());
}
