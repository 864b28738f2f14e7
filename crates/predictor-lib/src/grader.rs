//! Letter grading of predicted scores

use crate::models::Grade;

/// Map an integer score to its letter grade
///
/// Thresholds are inclusive lower bounds: 90 is an A, 89 a B. Anything
/// below 60, including negative scores, is an F.
pub fn grade(score: i32) -> Grade {
    match score {
        s if s >= 90 => Grade::A,
        s if s >= 80 => Grade::B,
        s if s >= 70 => Grade::C,
        s if s >= 60 => Grade::D,
        _ => Grade::F,
    }
}
