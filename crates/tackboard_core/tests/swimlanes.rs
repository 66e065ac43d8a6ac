use tackboard_core::db::open_db_in_memory;
use tackboard_core::{
    Action, ActionError, ActionOutcome, BoardService, Column, Entry, LaneStatus, Swimlane,
};
use uuid::Uuid;

fn setup() -> rusqlite::Connection {
    open_db_in_memory().unwrap()
}

fn board(conn: &rusqlite::Connection) -> BoardService<'_> {
    let mut service = BoardService::new(conn);
    service.check_in("Robin", Uuid::new_v4()).unwrap();
    service
}

fn applied_swimlane(outcome: ActionOutcome) -> Swimlane {
    match outcome {
        ActionOutcome::Swimlane(swimlane) => swimlane,
        other => panic!("expected a swimlane outcome, got {other:?}"),
    }
}

fn applied_column(outcome: ActionOutcome) -> Column {
    match outcome {
        ActionOutcome::Column(column) => column,
        other => panic!("expected a column outcome, got {other:?}"),
    }
}

fn applied_entry(outcome: ActionOutcome) -> Entry {
    match outcome {
        ActionOutcome::Entry(entry) => entry,
        other => panic!("expected an entry outcome, got {other:?}"),
    }
}

fn add_swimlane(service: &BoardService<'_>, title: &str) -> Swimlane {
    applied_swimlane(
        service
            .apply(&Action::AddSwimlane {
                title: title.to_string(),
                wip_limit: 0,
            })
            .unwrap(),
    )
}

#[test]
fn added_swimlane_starts_active_without_target_dates() {
    let conn = setup();
    let service = board(&conn);

    let lane = add_swimlane(&service, "Team A");
    assert_eq!(lane.title, "Team A");
    assert_eq!(lane.wip_limit, 0);
    assert_eq!(lane.status, LaneStatus::Active);
    assert!(lane.target_start.is_none());
    assert!(lane.target_end.is_none());
}

#[test]
fn duplicate_active_title_is_rejected_and_nothing_is_created() {
    let conn = setup();
    let service = board(&conn);
    add_swimlane(&service, "Team A");

    let err = service
        .apply(&Action::AddSwimlane {
            title: "Team A".to_string(),
            wip_limit: 0,
        })
        .unwrap_err();
    assert!(matches!(err, ActionError::DuplicateSwimlaneTitle(_)));
    assert_eq!(service.active_swimlanes().unwrap().len(), 1);
}

#[test]
fn negative_wip_limit_is_rejected_at_creation() {
    let conn = setup();
    let service = board(&conn);

    let err = service
        .apply(&Action::AddSwimlane {
            title: "Team A".to_string(),
            wip_limit: -2,
        })
        .unwrap_err();
    assert!(matches!(err, ActionError::InvalidWipLimit(_)));
    assert!(service.active_swimlanes().unwrap().is_empty());
}

#[test]
fn occupied_swimlane_cannot_be_removed() {
    let conn = setup();
    let service = board(&conn);
    let lane = add_swimlane(&service, "Team A");
    let column = applied_column(
        service
            .apply(&Action::AddColumn { insertion_index: 0 })
            .unwrap(),
    );
    let note = applied_entry(
        service
            .apply(&Action::AddEntry {
                parent_id: None,
                insertion_index: -1,
                text: "card".to_string(),
            })
            .unwrap(),
    );
    service
        .apply(&Action::MoveEntryOnBoard {
            entry_id: note.id,
            column_id: column.id,
            swimlane_id: lane.id,
            board_index: 0,
            subcolumn_index: 0,
        })
        .unwrap();

    let err = service
        .apply(&Action::RemoveSwimlane {
            swimlane_id: lane.id,
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ActionError::SwimlaneOccupied {
            active_cards: 1,
            ..
        }
    ));
    assert_eq!(
        service.swimlane(lane.id, false).unwrap().unwrap().status,
        LaneStatus::Active
    );
}

#[test]
fn empty_swimlane_removal_tombstones_it() {
    let conn = setup();
    let service = board(&conn);
    let lane = add_swimlane(&service, "Team A");

    let removed = applied_swimlane(
        service
            .apply(&Action::RemoveSwimlane {
                swimlane_id: lane.id,
            })
            .unwrap(),
    );
    assert_eq!(removed.status, LaneStatus::Removed);
    assert!(service.active_swimlanes().unwrap().is_empty());
    assert!(service.swimlane(lane.id, true).unwrap().is_some());
}

#[test]
fn target_dates_set_parse_and_clear() {
    let conn = setup();
    let service = board(&conn);
    let lane = add_swimlane(&service, "Team A");

    let updated = applied_swimlane(
        service
            .apply(&Action::ModifySwimlane {
                swimlane_id: lane.id,
                field: "target_start".to_string(),
                value: "2026-09-01T08:00:00".to_string(),
            })
            .unwrap(),
    );
    let start = updated.target_start.unwrap();
    assert_eq!(start.year(), 2026);
    assert_eq!(u8::from(start.month()), 9);
    assert_eq!(start.hour(), 8);

    let reread = service.swimlane(lane.id, false).unwrap().unwrap();
    assert_eq!(reread.target_start, updated.target_start);

    let cleared = applied_swimlane(
        service
            .apply(&Action::ModifySwimlane {
                swimlane_id: lane.id,
                field: "target_start".to_string(),
                value: "".to_string(),
            })
            .unwrap(),
    );
    assert!(cleared.target_start.is_none());
}

#[test]
fn malformed_target_date_is_rejected() {
    let conn = setup();
    let service = board(&conn);
    let lane = add_swimlane(&service, "Team A");

    let err = service
        .apply(&Action::ModifySwimlane {
            swimlane_id: lane.id,
            field: "target_end".to_string(),
            value: "next tuesday".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, ActionError::InvalidTargetDate(_)));
}

#[test]
fn status_field_cannot_remove_and_reactivation_checks_titles() {
    let conn = setup();
    let service = board(&conn);
    let lane = add_swimlane(&service, "Team A");

    let err = service
        .apply(&Action::ModifySwimlane {
            swimlane_id: lane.id,
            field: "status".to_string(),
            value: "removed".to_string(),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ActionError::RemoveViaModify {
            use_instead: "remove_swimlane"
        }
    ));

    service
        .apply(&Action::RemoveSwimlane {
            swimlane_id: lane.id,
        })
        .unwrap();
    add_swimlane(&service, "Team A");

    let err = service
        .apply(&Action::ModifySwimlane {
            swimlane_id: lane.id,
            field: "status".to_string(),
            value: "active".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, ActionError::ReactivationTitleClash(_)));
}

#[test]
fn unknown_field_is_rejected() {
    let conn = setup();
    let service = board(&conn);
    let lane = add_swimlane(&service, "Team A");

    let err = service
        .apply(&Action::ModifySwimlane {
            swimlane_id: lane.id,
            field: "owner".to_string(),
            value: "someone".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, ActionError::UnrecognizedField(_)));
}
