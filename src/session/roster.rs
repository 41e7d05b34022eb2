use std::collections::HashMap;
use std::collections::hash_map;

use indexmap::IndexMap;
use indexmap::map::Entry;
use tracing::warn;

use crate::error::BackendError;
use crate::models::{ClassRoster, Mark, RosterEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentMark {
    pub student_id: String,
    pub display_name: String,
    pub mark: Mark,
}

/// Marks keyed by student id, in roster order.
pub type Marks = IndexMap<String, StudentMark>;

/// Builds the initial marks from a roster snapshot.
///
/// Students default to [`Mark::Present`]; a prior mark reported by the roster
/// (attendance already recorded for the date) takes precedence. Order follows
/// the roster exactly, and the same roster always yields the same marks.
pub fn bootstrap(roster: &ClassRoster) -> Result<Marks, BackendError> {
    let mut marks = Marks::with_capacity(roster.students.len());

    for entry in &roster.students {
        match marks.entry(entry.student_id.clone()) {
            Entry::Occupied(_) => return Err(duplicate_student(roster, entry)),
            Entry::Vacant(slot) => {
                slot.insert(StudentMark {
                    student_id: entry.student_id.clone(),
                    display_name: entry.display_name.clone(),
                    mark: entry.prior_mark.unwrap_or_default(),
                });
            }
        }
    }

    Ok(marks)
}

/// Re-derives marks for the students of `snapshot` from a freshly fetched roster.
///
/// The student set and order never change after load: entries the fresh roster
/// adds are ignored, students it no longer reports fall back to `Present`.
/// A fresh roster listing a student twice is rejected like in [`bootstrap`].
pub fn reconcile(snapshot: &Marks, fresh: &ClassRoster) -> Result<Marks, BackendError> {
    let mut fresh_entries: HashMap<&str, &RosterEntry> = HashMap::with_capacity(fresh.students.len());
    for entry in &fresh.students {
        match fresh_entries.entry(entry.student_id.as_str()) {
            hash_map::Entry::Occupied(_) => return Err(duplicate_student(fresh, entry)),
            hash_map::Entry::Vacant(slot) => {
                slot.insert(entry);
            }
        }
    }

    for entry in fresh.students.iter().filter(|e| !snapshot.contains_key(&e.student_id)) {
        warn!(
            class_id = %fresh.context.class_id,
            student_id = %entry.student_id,
            "Ignoring student not present in the roster loaded at open"
        );
    }

    Ok(snapshot
        .values()
        .map(|student| {
            let mark = match fresh_entries.get(student.student_id.as_str()) {
                Some(entry) => entry.prior_mark.unwrap_or_default(),
                None => {
                    warn!(
                        class_id = %fresh.context.class_id,
                        student_id = %student.student_id,
                        "Student missing from reloaded roster, defaulting to present"
                    );
                    Mark::Present
                }
            };
            (
                student.student_id.clone(),
                StudentMark {
                    mark,
                    ..student.clone()
                },
            )
        })
        .collect())
}

fn duplicate_student(roster: &ClassRoster, entry: &RosterEntry) -> BackendError {
    BackendError::Validation(format!(
        "duplicate student id {} in roster of class {}",
        entry.student_id, roster.context.class_id
    ))
}

pub(crate) fn snapshot_marks(marks: &Marks) -> IndexMap<String, Mark> {
    marks
        .iter()
        .map(|(id, student)| (id.clone(), student.mark))
        .collect()
}
