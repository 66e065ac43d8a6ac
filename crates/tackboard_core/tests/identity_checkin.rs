use tackboard_core::db::open_db_in_memory;
use tackboard_core::repo::identity_repo;
use tackboard_core::{Action, ActionError, BoardService, IdentityError};
use uuid::Uuid;

fn setup() -> rusqlite::Connection {
    open_db_in_memory().unwrap()
}

#[test]
fn first_check_in_creates_the_identity_record() {
    let conn = setup();
    let mut service = BoardService::new(&conn);
    let uid = Uuid::new_v4();

    let identity = service.check_in("Robin", uid).unwrap();
    assert_eq!(identity.uid, uid);
    assert_eq!(identity.name, "Robin");

    let stored = identity_repo::user_by_uid(&conn, uid).unwrap().unwrap();
    assert_eq!(stored.name, "Robin");
    assert_eq!(service.current_identity().unwrap().uid, uid);
}

#[test]
fn repeat_check_in_with_the_same_pair_is_idempotent() {
    let conn = setup();
    let mut service = BoardService::new(&conn);
    let uid = Uuid::new_v4();

    service.check_in("Robin", uid).unwrap();
    let again = service.check_in("Robin", uid).unwrap();
    assert_eq!(again.uid, uid);

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn name_matching_is_case_insensitive() {
    let conn = setup();
    let mut service = BoardService::new(&conn);
    let uid = Uuid::new_v4();

    service.check_in("Robin", uid).unwrap();
    let again = service.check_in("robin", uid).unwrap();
    assert_eq!(again.uid, uid);

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn same_name_with_a_different_uid_is_a_conflict() {
    let conn = setup();
    let mut service = BoardService::new(&conn);
    let uid = Uuid::new_v4();
    service.check_in("Robin", uid).unwrap();

    let err = service.check_in("Robin", Uuid::new_v4()).unwrap_err();
    assert!(matches!(
        err,
        IdentityError::Conflict {
            same_name: 1,
            same_uid: 0,
            ..
        }
    ));
    // The failed check-in leaves the previous session identity in place.
    assert_eq!(service.current_identity().unwrap().uid, uid);
}

#[test]
fn same_uid_with_a_different_name_is_a_conflict() {
    let conn = setup();
    let mut service = BoardService::new(&conn);
    let uid = Uuid::new_v4();
    service.check_in("Robin", uid).unwrap();

    let err = service.check_in("Morgan", uid).unwrap_err();
    assert!(matches!(
        err,
        IdentityError::Conflict {
            same_name: 0,
            same_uid: 1,
            ..
        }
    ));
}

#[test]
fn actions_require_a_checked_in_identity() {
    let conn = setup();
    let service = BoardService::new(&conn);

    let err = service
        .apply(&Action::AddColumn { insertion_index: 0 })
        .unwrap_err();
    assert!(matches!(
        err,
        ActionError::Identity(IdentityError::NoCurrentIdentity)
    ));
    assert!(matches!(
        service.current_identity().unwrap_err(),
        IdentityError::NoCurrentIdentity
    ));
}
