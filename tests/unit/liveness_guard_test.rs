//! Unit tests for the Liveness Guard implementations.

use marksmith::services::liveness_guard::{FixedGuard, LivenessGuard, ProcessScanGuard};
use marksmith::types::settings::{LivenessSettings, ProcessMatcher};
use rstest::rstest;

#[rstest]
#[case::linux_firefox(&["systemd", "firefox"], Some("Firefox"))]
#[case::linux_librewolf_bin(&["librewolf-bin"], Some("LibreWolf"))]
#[case::windows_exe(&["explorer.exe", "firefox.exe"], Some("Firefox"))]
#[case::macos_path(&["/Applications/Firefox.app/Contents/MacOS/firefox"], Some("Firefox"))]
#[case::esr(&["firefox-esr"], Some("Firefox ESR"))]
#[case::lookalike(&["firefoxpwa", "notfirefox"], None)]
#[case::nothing(&["bash", "sshd"], None)]
fn test_default_matchers(#[case] running: &[&str], #[case] expected: Option<&str>) {
    let guard = ProcessScanGuard::from_settings(&LivenessSettings::default());
    assert_eq!(guard.match_processes(running).as_deref(), expected);
}

#[test]
fn test_custom_matchers() {
    let guard = ProcessScanGuard::new(vec![ProcessMatcher::new("waterfox", "Waterfox")]);
    assert_eq!(guard.match_processes(&["Waterfox"]), Some("Waterfox".to_string()));
    assert_eq!(guard.match_processes(&["firefox"]), None);
}

#[test]
fn test_empty_matcher_list_never_reports() {
    let guard = ProcessScanGuard::new(Vec::new());
    assert_eq!(guard.owner_running(), None);
}

#[test]
fn test_scan_of_real_process_list_does_not_panic() {
    // The result depends on the machine; only the call itself is checked.
    let _ = ProcessScanGuard::from_settings(&LivenessSettings::default()).owner_running();
}

#[test]
fn test_fixed_guard_behind_trait_object() {
    let guards: Vec<Box<dyn LivenessGuard>> = vec![
        Box::new(FixedGuard::idle()),
        Box::new(FixedGuard::running("LibreWolf")),
    ];
    let answers: Vec<Option<String>> = guards.iter().map(|g| g.owner_running()).collect();
    assert_eq!(answers, vec![None, Some("LibreWolf".to_string())]);
}
