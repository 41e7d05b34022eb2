mod common;

use attendance::error::BackendError;
use attendance::models::{Mark, RosterEntry};
use attendance::session::roster::{bootstrap, reconcile};

use common::*;

#[test]
fn test_fresh_roster_defaults_everyone_present() {
    let marks = bootstrap(&roster(false, &[])).expect("bootstrap failed");

    assert_eq!(marks.len(), 3);
    assert!(marks.values().all(|s| s.mark == Mark::Present));
    assert_eq!(marks[STUDENT_2].display_name, "Bilal Khan");
}

#[test]
fn test_prior_marks_override_default() {
    let marks = bootstrap(&roster(true, &[STUDENT_1, STUDENT_3])).expect("bootstrap failed");

    assert_eq!(marks[STUDENT_1].mark, Mark::Absent);
    assert_eq!(marks[STUDENT_2].mark, Mark::Present);
    assert_eq!(marks[STUDENT_3].mark, Mark::Absent);
}

#[test]
fn test_marks_follow_roster_order() {
    let mut snapshot = roster(false, &[]);
    snapshot.students.reverse();

    let marks = bootstrap(&snapshot).expect("bootstrap failed");
    let order: Vec<&str> = marks.keys().map(String::as_str).collect();
    assert_eq!(order, vec![STUDENT_3, STUDENT_2, STUDENT_1]);
}

#[test]
fn test_bootstrap_is_deterministic() {
    let snapshot = roster(true, &[STUDENT_2]);

    let first = bootstrap(&snapshot).expect("bootstrap failed");
    let second = bootstrap(&snapshot).expect("bootstrap failed");
    assert_eq!(first, second);
    assert!(first.keys().eq(second.keys()));
}

#[test]
fn test_duplicate_student_is_rejected() {
    let mut snapshot = roster(false, &[]);
    snapshot.students.push(RosterEntry {
        student_id: STUDENT_1.to_string(),
        display_name: "Asha again".to_string(),
        prior_mark: None,
    });

    let err = bootstrap(&snapshot).unwrap_err();
    assert!(matches!(err, BackendError::Validation(msg) if msg.contains(STUDENT_1)));
}

#[test]
fn test_reconcile_keeps_load_time_students_and_order() {
    let loaded = bootstrap(&roster(true, &[])).expect("bootstrap failed");

    let mut fresh = roster(true, &[STUDENT_2]);
    fresh.students.reverse();
    fresh.students.retain(|s| s.student_id != STUDENT_3);
    fresh.students.push(RosterEntry {
        student_id: "11899999".to_string(),
        display_name: "Late Joiner".to_string(),
        prior_mark: Some(Mark::Absent),
    });

    let marks = reconcile(&loaded, &fresh).expect("reconcile failed");
    let order: Vec<&str> = marks.keys().map(String::as_str).collect();
    assert_eq!(order, vec![STUDENT_1, STUDENT_2, STUDENT_3]);
    assert_eq!(marks[STUDENT_2].mark, Mark::Absent);
    assert_eq!(marks[STUDENT_3].mark, Mark::Present);
    assert!(!marks.contains_key("11899999"));
}

#[test]
fn test_reconcile_of_identical_roster_matches_bootstrap() {
    let snapshot = roster(true, &[STUDENT_3]);
    let loaded = bootstrap(&snapshot).expect("bootstrap failed");

    assert_eq!(reconcile(&loaded, &snapshot).expect("reconcile failed"), loaded);
}

#[test]
fn test_reconcile_rejects_duplicate_student() {
    let loaded = bootstrap(&roster(true, &[])).expect("bootstrap failed");

    let mut fresh = roster(true, &[STUDENT_1]);
    fresh.students.push(RosterEntry {
        student_id: STUDENT_2.to_string(),
        display_name: "Bilal again".to_string(),
        prior_mark: Some(Mark::Absent),
    });

    let err = reconcile(&loaded, &fresh).unwrap_err();
    assert!(matches!(err, BackendError::Validation(msg) if msg.contains(STUDENT_2)));
}
