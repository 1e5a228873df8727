//! Property-based tests for staged edit sequences.
//!
//! For any sequence of edits, accepted or rejected, the in-memory tree must
//! equal a fresh load of the staging copy and stay structurally valid. The
//! source file must never change until commit.

#[path = "../common/mod.rs"]
mod common;

use common::*;
use marksmith::database::Database;
use marksmith::managers::edit_session::EditSession;
use marksmith::types::bookmark::NodeId;
use marksmith::types::settings::AppSettings;
use proptest::prelude::*;

/// Edits addressed by index into the current walk order, so every
/// generated sequence targets nodes that exist at the time it runs.
#[derive(Debug, Clone)]
enum EditOp {
    Rename(usize, String),
    SetUrl(usize, u8),
    Add(usize, String),
    Move(usize, usize, i64),
    Delete(usize),
    ScratchAdd(String),
}

fn arb_title() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ]{0,12}"
}

fn arb_ops() -> impl Strategy<Value = Vec<EditOp>> {
    prop::collection::vec(
        prop_oneof![
            3 => (0..32usize, arb_title()).prop_map(|(i, t)| EditOp::Rename(i, t)),
            1 => (0..32usize, 0..4u8).prop_map(|(i, n)| EditOp::SetUrl(i, n)),
            3 => (0..32usize, arb_title()).prop_map(|(i, t)| EditOp::Add(i, t)),
            3 => (0..32usize, 0..32usize, -1..6i64).prop_map(|(i, p, pos)| EditOp::Move(i, p, pos)),
            2 => (0..32usize).prop_map(EditOp::Delete),
            1 => arb_title().prop_map(EditOp::ScratchAdd),
        ],
        1..12,
    )
}

fn pick(session: &EditSession, index: usize) -> NodeId {
    let ids: Vec<NodeId> = session.tree().walk().iter().map(|n| n.id).collect();
    ids[index % ids.len()]
}

fn pick_folder(session: &EditSession, index: usize) -> NodeId {
    let ids: Vec<NodeId> = session.tree().folders().iter().map(|n| n.id).collect();
    ids[index % ids.len()]
}

/// Applies one edit; rejected edits are part of the property.
fn apply(session: &mut EditSession, op: &EditOp) {
    let _ = match op {
        EditOp::Rename(i, title) => {
            let id = pick(session, *i);
            session.update_title(id, title).map(|_| ())
        }
        EditOp::SetUrl(i, n) => {
            let id = pick(session, *i);
            session
                .update_url(id, &format!("https://example{}.org/", n))
                .map(|_| ())
        }
        EditOp::Add(i, title) => {
            let parent = pick_folder(session, *i);
            session
                .add(parent, title, &format!("https://{}.example/", title.len()))
                .map(|_| ())
        }
        EditOp::Move(i, p, pos) => {
            let id = pick(session, *i);
            let parent = pick_folder(session, *p);
            session.move_node(id, parent, *pos)
        }
        EditOp::Delete(i) => {
            let id = pick(session, *i);
            session.delete(id)
        }
        EditOp::ScratchAdd(title) => session
            .scratch_add(title, "https://scratch.example/")
            .map(|_| ()),
    };
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn mirrored_tree_matches_staging_copy(ops in arb_ops()) {
        let fx = places_fixture();
        let before = fx.digest();
        let mut session = EditSession::open(&fx.path, &AppSettings::default()).unwrap();

        for op in &ops {
            apply(&mut session, op);
            if let Some(store) = session.staging() {
                let staged = store.load_tree().unwrap();
                prop_assert_eq!(session.tree(), &staged, "after {:?}", op);
            }
            prop_assert!(session.tree().validate().is_ok(), "after {:?}", op);
        }

        prop_assert_eq!(fx.digest(), before);
    }

    #[test]
    fn rollback_restores_source_view(ops in arb_ops()) {
        let fx = places_fixture();
        let before = fx.digest();
        let original = Database::open_read_only(&fx.path).unwrap().load_tree().unwrap();
        let mut session = EditSession::open(&fx.path, &AppSettings::default()).unwrap();

        for op in &ops {
            apply(&mut session, op);
        }
        session.rollback().unwrap();

        prop_assert_eq!(fx.digest(), before);
        prop_assert_eq!(session.tree(), &original);
        prop_assert!(session.staging().is_none());
    }
}
