use tackboard_core::db::open_db_in_memory;
use tackboard_core::{
    Action, ActionError, ActionOutcome, BoardCell, BoardService, Column, Entry, EntryId,
    EntryStatus, Swimlane,
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

fn applied_entry(outcome: ActionOutcome) -> Entry {
    match outcome {
        ActionOutcome::Entry(entry) => entry,
        other => panic!("expected an entry outcome, got {other:?}"),
    }
}

fn applied_column(outcome: ActionOutcome) -> Column {
    match outcome {
        ActionOutcome::Column(column) => column,
        other => panic!("expected a column outcome, got {other:?}"),
    }
}

fn applied_swimlane(outcome: ActionOutcome) -> Swimlane {
    match outcome {
        ActionOutcome::Swimlane(swimlane) => swimlane,
        other => panic!("expected a swimlane outcome, got {other:?}"),
    }
}

fn add_entry(service: &BoardService<'_>, parent: Option<EntryId>, text: &str) -> Entry {
    applied_entry(
        service
            .apply(&Action::AddEntry {
                parent_id: parent,
                insertion_index: -1,
                text: text.to_string(),
            })
            .unwrap(),
    )
}

fn outline_texts(service: &BoardService<'_>, parent: Option<EntryId>) -> Vec<(String, i64)> {
    service
        .outline_children(parent)
        .unwrap()
        .into_iter()
        .map(|entry| (entry.text, entry.outline_index))
        .collect()
}

#[test]
fn appended_entries_get_dense_outline_indices() {
    let conn = setup();
    let service = board(&conn);

    let a = add_entry(&service, None, "a");
    let b = add_entry(&service, None, "b");
    let c = add_entry(&service, None, "c");

    assert_eq!(a.outline_index, 0);
    assert_eq!(b.outline_index, 1);
    assert_eq!(c.outline_index, 2);
    assert_eq!(a.status, EntryStatus::Note);
    assert!(a.column_id.is_none());
    assert!(a.board_index.is_none());
}

#[test]
fn insert_at_front_shifts_siblings() {
    let conn = setup();
    let service = board(&conn);
    add_entry(&service, None, "a");
    add_entry(&service, None, "b");

    let first = applied_entry(
        service
            .apply(&Action::AddEntry {
                parent_id: None,
                insertion_index: 0,
                text: "z".to_string(),
            })
            .unwrap(),
    );
    assert_eq!(first.outline_index, 0);
    assert_eq!(
        outline_texts(&service, None),
        vec![
            ("z".to_string(), 0),
            ("a".to_string(), 1),
            ("b".to_string(), 2),
        ]
    );
}

#[test]
fn insertion_index_out_of_range_is_rejected() {
    let conn = setup();
    let service = board(&conn);
    add_entry(&service, None, "a");

    let err = service
        .apply(&Action::AddEntry {
            parent_id: None,
            insertion_index: 3,
            text: "x".to_string(),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ActionError::InvalidInsertionIndex {
            index: 3,
            upper_bound: 1
        }
    ));

    let err = service
        .apply(&Action::AddEntry {
            parent_id: None,
            insertion_index: -2,
            text: "x".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, ActionError::InvalidInsertionIndex { .. }));
}

#[test]
fn adding_under_a_removed_parent_is_rejected() {
    let conn = setup();
    let service = board(&conn);
    let parent = add_entry(&service, None, "parent");
    service
        .apply(&Action::RemoveEntry {
            entry_id: parent.id,
        })
        .unwrap();

    let err = service
        .apply(&Action::AddEntry {
            parent_id: Some(parent.id),
            insertion_index: -1,
            text: "child".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, ActionError::EntryNotFound(id) if id == parent.id));
}

#[test]
fn removal_cascades_through_the_subtree_and_spares_siblings() {
    let conn = setup();
    let service = board(&conn);
    let parent = add_entry(&service, None, "parent");
    let sibling = add_entry(&service, None, "sibling");
    let child = add_entry(&service, Some(parent.id), "child");
    let grandchild = add_entry(&service, Some(child.id), "grandchild");

    let removed = applied_entry(
        service
            .apply(&Action::RemoveEntry {
                entry_id: parent.id,
            })
            .unwrap(),
    );
    assert_eq!(removed.status, EntryStatus::Removed);

    for id in [parent.id, child.id, grandchild.id] {
        let entry = service.entry(id, true).unwrap().unwrap();
        assert_eq!(entry.status, EntryStatus::Removed, "entry {id}");
        assert!(service.entry(id, false).unwrap().is_none());
    }

    // The surviving sibling keeps its index; the removed slot stays a gap.
    let survivors = outline_texts(&service, None);
    assert_eq!(survivors, vec![("sibling".to_string(), 1)]);
    let _ = sibling;
}

#[test]
fn modify_entry_edits_text_and_status_but_not_removal() {
    let conn = setup();
    let service = board(&conn);
    let entry = add_entry(&service, None, "draft");

    let retitled = applied_entry(
        service
            .apply(&Action::ModifyEntry {
                entry_id: entry.id,
                field: "text".to_string(),
                value: "final".to_string(),
            })
            .unwrap(),
    );
    assert_eq!(retitled.text, "final");

    let err = service
        .apply(&Action::ModifyEntry {
            entry_id: entry.id,
            field: "status".to_string(),
            value: "removed".to_string(),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ActionError::RemoveViaModify {
            use_instead: "remove_entry"
        }
    ));

    let err = service
        .apply(&Action::ModifyEntry {
            entry_id: entry.id,
            field: "status".to_string(),
            value: "paused".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, ActionError::InvalidStatusValue(_)));

    let blocked = applied_entry(
        service
            .apply(&Action::ModifyEntry {
                entry_id: entry.id,
                field: "status".to_string(),
                value: "blocked".to_string(),
            })
            .unwrap(),
    );
    assert_eq!(blocked.status, EntryStatus::Blocked);
}

#[test]
fn outline_move_reorders_siblings() {
    let conn = setup();
    let service = board(&conn);
    add_entry(&service, None, "a");
    add_entry(&service, None, "b");
    let c = add_entry(&service, None, "c");

    service
        .apply(&Action::MoveEntryOnOutline {
            entry_id: c.id,
            new_parent_id: None,
            insertion_index: 0,
        })
        .unwrap();

    assert_eq!(
        outline_texts(&service, None),
        vec![
            ("c".to_string(), 0),
            ("a".to_string(), 1),
            ("b".to_string(), 2),
        ]
    );
}

#[test]
fn outline_move_with_minus_one_appends_under_new_parent() {
    let conn = setup();
    let service = board(&conn);
    let parent = add_entry(&service, None, "parent");
    add_entry(&service, Some(parent.id), "first");
    let stray = add_entry(&service, None, "stray");

    let moved = applied_entry(
        service
            .apply(&Action::MoveEntryOnOutline {
                entry_id: stray.id,
                new_parent_id: Some(parent.id),
                insertion_index: -1,
            })
            .unwrap(),
    );
    assert_eq!(moved.branch_id, Some(parent.id));
    assert_eq!(moved.outline_index, 1);
    assert_eq!(
        outline_texts(&service, Some(parent.id)),
        vec![("first".to_string(), 0), ("stray".to_string(), 1)]
    );
    // The old sibling group closes up behind the moved entry.
    assert_eq!(outline_texts(&service, None), vec![("parent".to_string(), 0)]);
}

#[test]
fn outline_move_rejects_cycles() {
    let conn = setup();
    let service = board(&conn);
    let parent = add_entry(&service, None, "parent");
    let child = add_entry(&service, Some(parent.id), "child");
    let grandchild = add_entry(&service, Some(child.id), "grandchild");

    let err = service
        .apply(&Action::MoveEntryOnOutline {
            entry_id: parent.id,
            new_parent_id: Some(grandchild.id),
            insertion_index: 0,
        })
        .unwrap_err();
    assert!(matches!(err, ActionError::OutlineCycle { .. }));

    let err = service
        .apply(&Action::MoveEntryOnOutline {
            entry_id: parent.id,
            new_parent_id: Some(parent.id),
            insertion_index: 0,
        })
        .unwrap_err();
    assert!(matches!(err, ActionError::OutlineCycle { .. }));
}

#[test]
fn board_placement_promotes_a_note_to_a_card() {
    let conn = setup();
    let service = board(&conn);
    let column = applied_column(
        service
            .apply(&Action::AddColumn { insertion_index: 0 })
            .unwrap(),
    );
    let lane = applied_swimlane(
        service
            .apply(&Action::AddSwimlane {
                title: "Default".to_string(),
                wip_limit: 0,
            })
            .unwrap(),
    );
    let note = add_entry(&service, None, "task");

    let card = applied_entry(
        service
            .apply(&Action::MoveEntryOnBoard {
                entry_id: note.id,
                column_id: column.id,
                swimlane_id: lane.id,
                board_index: 0,
                subcolumn_index: 0,
            })
            .unwrap(),
    );
    assert_eq!(card.status, EntryStatus::Card);
    assert_eq!(card.column_id, Some(column.id));
    assert_eq!(card.swimlane_id, Some(lane.id));
    assert_eq!(card.board_index, Some(0));
    // The card keeps its place in the outline.
    assert_eq!(card.outline_index, 0);
    assert_eq!(card.branch_id, None);
}

#[test]
fn board_move_renumbers_both_cells() {
    let conn = setup();
    let service = board(&conn);
    let column = applied_column(
        service
            .apply(&Action::AddColumn { insertion_index: 0 })
            .unwrap(),
    );
    let lane = applied_swimlane(
        service
            .apply(&Action::AddSwimlane {
                title: "Default".to_string(),
                wip_limit: 0,
            })
            .unwrap(),
    );
    let first = add_entry(&service, None, "first");
    let second = add_entry(&service, None, "second");
    for (entry_id, board_index) in [(first.id, 0), (second.id, 1)] {
        service
            .apply(&Action::MoveEntryOnBoard {
                entry_id,
                column_id: column.id,
                swimlane_id: lane.id,
                board_index,
                subcolumn_index: 0,
            })
            .unwrap();
    }

    service
        .apply(&Action::MoveEntryOnBoard {
            entry_id: first.id,
            column_id: column.id,
            swimlane_id: lane.id,
            board_index: 1,
            subcolumn_index: 0,
        })
        .unwrap();

    let cell = BoardCell {
        column_id: column.id,
        swimlane_id: lane.id,
        subcolumn_index: 0,
    };
    let cards: Vec<(EntryId, Option<i64>)> = service
        .cell_cards(&cell)
        .unwrap()
        .into_iter()
        .map(|entry| (entry.id, entry.board_index))
        .collect();
    assert_eq!(cards, vec![(second.id, Some(0)), (first.id, Some(1))]);
}

#[test]
fn board_index_out_of_range_is_rejected() {
    let conn = setup();
    let service = board(&conn);
    let column = applied_column(
        service
            .apply(&Action::AddColumn { insertion_index: 0 })
            .unwrap(),
    );
    let lane = applied_swimlane(
        service
            .apply(&Action::AddSwimlane {
                title: "Default".to_string(),
                wip_limit: 0,
            })
            .unwrap(),
    );
    let note = add_entry(&service, None, "task");

    let err = service
        .apply(&Action::MoveEntryOnBoard {
            entry_id: note.id,
            column_id: column.id,
            swimlane_id: lane.id,
            board_index: 1,
            subcolumn_index: 0,
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ActionError::InvalidBoardIndex {
            index: 1,
            upper_bound: 0
        }
    ));
}

#[test]
fn wip_limit_blocks_entry_but_not_moves_within_the_column() {
    let conn = setup();
    let service = board(&conn);
    let column = applied_column(
        service
            .apply(&Action::AddColumn { insertion_index: 0 })
            .unwrap(),
    );
    service
        .apply(&Action::ModifyColumn {
            column_id: column.id,
            field: "wip_limit".to_string(),
            value: "1".to_string(),
        })
        .unwrap();
    let lane = applied_swimlane(
        service
            .apply(&Action::AddSwimlane {
                title: "Default".to_string(),
                wip_limit: 0,
            })
            .unwrap(),
    );
    let first = add_entry(&service, None, "first");
    let second = add_entry(&service, None, "second");

    service
        .apply(&Action::MoveEntryOnBoard {
            entry_id: first.id,
            column_id: column.id,
            swimlane_id: lane.id,
            board_index: 0,
            subcolumn_index: 0,
        })
        .unwrap();

    let err = service
        .apply(&Action::MoveEntryOnBoard {
            entry_id: second.id,
            column_id: column.id,
            swimlane_id: lane.id,
            board_index: 1,
            subcolumn_index: 0,
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ActionError::WipLimitReached {
            limit: 1,
            active_cards: 1
        }
    ));

    // Repositioning the card already in the column is not an entry.
    service
        .apply(&Action::MoveEntryOnBoard {
            entry_id: first.id,
            column_id: column.id,
            swimlane_id: lane.id,
            board_index: 0,
            subcolumn_index: 1,
        })
        .unwrap();
}

#[test]
fn board_move_to_a_removed_column_is_rejected() {
    let conn = setup();
    let service = board(&conn);
    let column = applied_column(
        service
            .apply(&Action::AddColumn { insertion_index: 0 })
            .unwrap(),
    );
    service
        .apply(&Action::RemoveColumn {
            column_id: column.id,
        })
        .unwrap();
    let lane = applied_swimlane(
        service
            .apply(&Action::AddSwimlane {
                title: "Default".to_string(),
                wip_limit: 0,
            })
            .unwrap(),
    );
    let note = add_entry(&service, None, "task");

    let err = service
        .apply(&Action::MoveEntryOnBoard {
            entry_id: note.id,
            column_id: column.id,
            swimlane_id: lane.id,
            board_index: 0,
            subcolumn_index: 0,
        })
        .unwrap_err();
    assert!(matches!(err, ActionError::ColumnNotFound(id) if id == column.id));
}
