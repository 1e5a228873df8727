//! Property-based tests for AppSettings serialization round-trip.
//!
//! These tests verify that AppSettings can be serialized to JSON and
//! deserialized back without data loss for arbitrary valid inputs, and that
//! the engine persists what it accepts.

use marksmith::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use marksmith::types::settings::{
    AppSettings, AuditSettings, GeneralSettings, LivenessSettings, ProcessMatcher,
};
use proptest::prelude::*;

fn arb_general_settings() -> impl Strategy<Value = GeneralSettings> {
    (
        "[A-Za-z][A-Za-z0-9 _-]{0,20}",
        proptest::option::of("/[a-z0-9/_-]{1,30}"),
    )
        .prop_map(|(scratch_folder_title, export_dir)| GeneralSettings {
            scratch_folder_title,
            export_dir,
        })
}

fn arb_process_matcher() -> impl Strategy<Value = ProcessMatcher> {
    ("[a-z][a-z0-9-]{1,15}", "[A-Z][A-Za-z ]{1,15}")
        .prop_map(|(exe, name)| ProcessMatcher::new(&exe, &name))
}

fn arb_liveness_settings() -> impl Strategy<Value = LivenessSettings> {
    proptest::collection::vec(arb_process_matcher(), 0..6)
        .prop_map(|processes| LivenessSettings { processes })
}

fn arb_audit_settings() -> impl Strategy<Value = AuditSettings> {
    (1usize..64, 1u64..120, "[a-zA-Z0-9/. ]{1,30}", 0usize..20).prop_map(
        |(workers, timeout_secs, user_agent, max_redirects)| AuditSettings {
            workers,
            timeout_secs,
            user_agent,
            max_redirects,
        },
    )
}

fn arb_app_settings() -> impl Strategy<Value = AppSettings> {
    (arb_general_settings(), arb_liveness_settings(), arb_audit_settings()).prop_map(
        |(general, liveness, audit)| AppSettings {
            general,
            liveness,
            audit,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn settings_json_roundtrip(settings in arb_app_settings()) {
        let json = serde_json::to_string(&settings).unwrap();
        let back: AppSettings = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, settings);
    }

    #[test]
    fn set_workers_then_reload(workers in 1usize..256) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json").to_string_lossy().to_string();
        let mut engine = SettingsEngine::new(Some(path.clone()));
        engine.load().unwrap();

        engine.set_value("audit.workers", serde_json::json!(workers)).unwrap();

        let mut fresh = SettingsEngine::new(Some(path));
        prop_assert_eq!(fresh.load().unwrap().audit.workers, workers);
    }
}
