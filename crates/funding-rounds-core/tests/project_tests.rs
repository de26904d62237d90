use funding_rounds_core::project::{
    default_project, JsonFileStore, MemoryStore, PhasePatch, ProjectSession, ProjectSnapshot,
    ProjectState, ProjectStore, RoundPatch, DEFAULT_HISTORY_LIMIT,
};
use funding_rounds_core::rounds::{compute_rounds, Capitalization, RoundId};
use funding_rounds_core::FundingRoundsError;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use serde_json::json;

fn ids(state: &ProjectState) -> Vec<u64> {
    state.inputs().iter().map(|r| r.id.0).collect()
}

// ===========================================================================
// Editing the default plan
// ===========================================================================

#[test]
fn test_delete_matches_fresh_computation() {
    let mut state = default_project();
    state.delete_round(RoundId(3)).unwrap();

    let fresh = compute_rounds(state.capitalization(), state.inputs());
    assert_eq!(state.rounds(), fresh.as_slice());
    assert_eq!(ids(&state), vec![1, 4, 5]);
    // 1,052,632 / 0.90 = 1,169,591.11 -> 1,169,591
    assert_eq!(state.rounds()[1].total_shares, dec!(1169591));
}

#[test]
fn test_new_round_takes_next_counter_value() {
    let mut state = default_project();
    let id = state.add_round();
    assert_eq!(id, RoundId(6));
    assert_eq!(state.round(id).unwrap().name(), "Series E");
    assert_eq!(state.rounds().last().unwrap().id(), id);
}

#[test]
fn test_update_cascades_to_ownership_and_projection() {
    let mut state = default_project();
    let before = state.view();
    state
        .update_round(
            RoundId(1),
            RoundPatch {
                sold_percentage: Some(dec!(20)),
                ..Default::default()
            },
        )
        .unwrap();
    let after = state.view();

    assert!(after.ownership.final_shares > before.ownership.final_shares);
    assert_eq!(after.ownership.founders().unwrap().shares, dec!(1000000));
    let eps_before = before.projection.unwrap().eps;
    let eps_after = after.projection.unwrap().eps;
    assert!(eps_after < eps_before);
}

#[test]
fn test_sort_by_timing_restores_chronology() {
    let mut state = default_project();
    state.move_round(RoundId(5), 0).unwrap();
    assert_eq!(ids(&state), vec![5, 1, 3, 4]);

    assert!(state.sort_by_timing());
    // "Founding" has no month and inherits 36 from the round in front of it.
    assert_eq!(ids(&state), vec![3, 4, 5, 1]);
    assert!(!state.sort_by_timing());
}

#[test]
fn test_capitalization_change_recomputes_everything() {
    let mut state = default_project();
    state.set_capitalization(Capitalization::new(2_000_000, dec!(0.10)).unwrap());
    assert_eq!(state.rounds()[0].total_shares, dec!(2105263));
    // 1,200,000 / 2,105,263 = 0.57, against an initial price of 0.10.
    assert!((state.rounds()[0].profit_multiplier - dec!(5.7)).abs() < dec!(0.001));
}

#[test]
fn test_phase_and_rate_edits() {
    let mut state = default_project();
    state.set_distribution_rate(dec!(-10));
    assert_eq!(state.distribution_rate(), dec!(0));

    state
        .update_phase(
            "good",
            PhasePatch {
                month: Some(36),
                ..Default::default()
            },
        )
        .unwrap();
    state.set_current_phase("good").unwrap();
    let p = state.projection().unwrap();
    assert_eq!(p.round_id, Some(RoundId(5)));
    assert_eq!(p.cash_per_share, dec!(0));

    assert!(matches!(
        state.update_phase("none", PhasePatch::default()),
        Err(FundingRoundsError::PhaseNotFound(_))
    ));
}

// ===========================================================================
// Undo / redo
// ===========================================================================

#[test]
fn test_undo_walks_back_through_edits() {
    let mut session = ProjectSession::open(MemoryStore::new()).unwrap();
    let original = session.state().inputs().to_vec();

    let id = session.add_round();
    session
        .update_round(
            id,
            RoundPatch {
                funding_amount: Some(dec!(750000)),
                ..Default::default()
            },
        )
        .unwrap();
    session.delete_round(RoundId(3)).unwrap();

    assert!(session.undo());
    assert!(session.undo());
    assert!(session.undo());
    assert!(!session.undo());
    assert_eq!(session.state().inputs(), original.as_slice());
    // The id handed to the undone round stays spent.
    assert_eq!(session.state().round_counter(), 6);
}

#[test]
fn test_undone_round_id_is_not_reissued() {
    let mut session = ProjectSession::open(MemoryStore::new()).unwrap();
    let first = session.add_round();
    assert!(session.undo());
    assert!(session.state().round(first).is_none());

    let second = session.add_round();
    assert_ne!(first, second);
    assert_eq!(second, RoundId(7));

    // Redo is gone, and undoing again keeps both ids spent.
    assert!(session.undo());
    assert_eq!(session.add_round(), RoundId(8));
}

#[test]
fn test_new_edit_after_undo_discards_redo() {
    let mut session = ProjectSession::open(MemoryStore::new()).unwrap();
    session.add_round();
    assert!(session.undo());
    assert!(session.can_redo());

    session.delete_round(RoundId(4)).unwrap();
    assert!(!session.can_redo());
    assert!(!session.redo());
}

#[test]
fn test_history_is_capped() {
    let mut session = ProjectSession::open(MemoryStore::new()).unwrap();
    for _ in 0..(DEFAULT_HISTORY_LIMIT + 10) {
        session.add_round();
    }
    let mut steps = 0;
    while session.undo() {
        steps += 1;
    }
    assert_eq!(steps, DEFAULT_HISTORY_LIMIT);
    assert_eq!(session.state().rounds().len(), 4 + 10);
}

#[test]
fn test_undo_persists_restored_sequence() {
    let mut session = ProjectSession::open(MemoryStore::new()).unwrap();
    session.delete_round(RoundId(5)).unwrap();
    assert_eq!(session.store().snapshot().unwrap().rounds.len(), 3);
    session.undo();
    assert_eq!(session.store().snapshot().unwrap().rounds.len(), 4);
}

// ===========================================================================
// Persistence
// ===========================================================================

#[test]
fn test_session_reopens_saved_project() {
    let mut session = ProjectSession::open(MemoryStore::new()).unwrap();
    session.delete_round(RoundId(3)).unwrap();
    session.set_current_phase("good").unwrap();
    let store = session.into_store();

    let reopened = ProjectSession::open(store).unwrap();
    assert_eq!(ids(reopened.state()), vec![1, 4, 5]);
    assert_eq!(reopened.state().current_phase(), "good");
    assert!(!reopened.can_undo());
}

#[test]
fn test_roundless_snapshot_falls_back_to_default() {
    let empty = ProjectSnapshot::from_json(&json!({ "projectName": "Empty", "rounds": [] })).unwrap();
    let session = ProjectSession::open(MemoryStore::with_snapshot(empty)).unwrap();
    assert_eq!(session.state().rounds().len(), 4);
    assert_eq!(session.store().saves(), 1);
}

#[test]
fn test_unreadable_file_is_left_untouched() {
    let dir = std::env::temp_dir().join(format!("funding-rounds-it-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("broken.json");
    let contents = r#"{"projectName":"Mine","rounds":[{"id":1,"name":"Seed","fundingAmount":1000,"soldPercentage":10},]}"#;
    std::fs::write(&path, contents).unwrap();

    let err = ProjectSession::open(JsonFileStore::new(&path)).unwrap_err();
    assert!(matches!(err, FundingRoundsError::SerializationError(_)));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), contents);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_missing_file_is_created_with_default() {
    let dir = std::env::temp_dir().join(format!("funding-rounds-new-{}", std::process::id()));
    let path = dir.join("nested").join("project.json");

    let session = ProjectSession::open(JsonFileStore::new(&path)).unwrap();
    assert_eq!(session.state().round_counter(), 5);
    assert!(session.last_save_error().is_none());

    let mut store = JsonFileStore::new(&path);
    let saved = store.load().unwrap().unwrap();
    assert_eq!(saved.rounds.len(), 4);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_persisted_document_shape() {
    let snapshot = ProjectSnapshot::from_state(&default_project());
    let doc = snapshot.to_json();
    let keys: Vec<&str> = doc.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "projectName",
            "initialShares",
            "initialPrice",
            "rounds",
            "roundCounter",
            "phases",
            "currentPhase",
            "distributionRate",
            "lastModified",
        ]
    );
    assert_eq!(doc["rounds"][1]["id"], 3);
    assert_eq!(doc["rounds"][1]["timing"], "Month 11");
    assert_eq!(doc["rounds"][3]["totalShares"], 1_563_625);
}
