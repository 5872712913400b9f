//! Streak calculation over a completed-date set.
//!
//! The current streak is the length of the run of consecutive completed days
//! that ends at the reference date, or at the day before it when the
//! reference date itself is still pending. A pending "today" therefore never
//! breaks a chain that ended yesterday; the chain simply stops growing once a
//! whole day passes without completion.

use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::iter::successors;

/// Current streak as of `reference`.
///
/// Walks the completed dates in descending order alongside the calendar,
/// starting at `reference` (or the day before, if `reference` is not
/// completed), and stops at the first gap. Dates after `reference` are
/// ignored.
pub fn compute_streak(completed: &BTreeSet<NaiveDate>, reference: NaiveDate) -> u32 {
    let anchor = if completed.contains(&reference) {
        reference
    } else {
        match reference.pred_opt() {
            Some(day) => day,
            None => return 0,
        }
    };

    let calendar = successors(Some(anchor), |day| day.pred_opt());
    completed
        .range(..=anchor)
        .rev()
        .zip(calendar)
        .take_while(|(done, expected)| **done == *expected)
        .count() as u32
}

/// Longest run of consecutive completed days anywhere in the set.
pub fn longest_streak(completed: &BTreeSet<NaiveDate>) -> u32 {
    let (best, _, _) = completed.iter().fold(
        (0u32, 0u32, None::<NaiveDate>),
        |(best, run, prev), &day| {
            let run = match prev {
                Some(p) if p.succ_opt() == Some(day) => run + 1,
                _ => 1,
            };
            (best.max(run), run, Some(day))
        },
    );
    best
}
