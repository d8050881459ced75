//! crates/journal_core/src/progression.rs
//!
//! The rolling-window rule that decides when an interest is ready for more
//! sophisticated prompts.

use crate::context::average;
use crate::domain::{UserInterest, MAX_LEVEL};

const MIN_SCORES: usize = 5;
const ADVANCE_AVERAGE: f64 = 7.0;
const STRONG_SCORE: u8 = 7;
const RECENT_SPAN: usize = 5;
const RECENT_STRONG_REQUIRED: usize = 4;

/// Records `score` in the interest's window and reports whether the level should advance.
///
/// The level itself is left untouched; callers apply the recommendation with
/// [`UserInterest::advance_level`].
pub fn check_and_advance_level(interest: &mut UserInterest, score: u8) -> bool {
    interest.record_score(score);
    should_advance(&interest.recent_scores, interest.progression_level)
}

/// Five or more scores, a mean of at least 7, four of the last five at 7 or above,
/// and room to grow.
pub fn should_advance(window: &[u8], level: u8) -> bool {
    if level >= MAX_LEVEL || window.len() < MIN_SCORES {
        return false;
    }
    let mean_ok = average(window).is_some_and(|avg| avg >= ADVANCE_AVERAGE);
    let recent_strong = window
        .iter()
        .rev()
        .take(RECENT_SPAN)
        .filter(|&&s| s >= STRONG_SCORE)
        .count();
    mean_ok && recent_strong >= RECENT_STRONG_REQUIRED
}
