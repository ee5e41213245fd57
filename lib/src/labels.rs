// lib/src/labels.rs
//
// Training-label derivation from the recorded triage grade. Lower grades are
// more urgent.

use models::{RawRecord, TriageLabel};

use crate::normalizer::normalize_field;

pub const TRIAGE_GRADE_FIELD: &str = "TriageGrade";

/// Maps a numeric grade to a label; `None` means the record is unlabeled and
/// must be left out of training.
pub fn map_grade(grade: Option<f64>) -> Option<TriageLabel> {
    let grade = grade?;
    Some(if grade <= 2.0 {
        TriageLabel::Emergency
    } else if grade == 3.0 {
        TriageLabel::HighRisk
    } else {
        TriageLabel::Routine
    })
}

/// Reads the grade field through the normalizer and maps it.
pub fn label_record(record: &RawRecord) -> Option<TriageLabel> {
    map_grade(normalize_field(TRIAGE_GRADE_FIELD, record.get(TRIAGE_GRADE_FIELD)))
}
