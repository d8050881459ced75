//! crates/journal_core/src/milestones.rs
//!
//! Goal progress, journaling streaks and the awards they unlock.

use crate::domain::{Goal, JournalSession};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Percentage of the way from goal creation to its target date, clamped to 0-100.
/// `None` when the goal has no target date.
pub fn goal_progress(goal: &Goal, today: NaiveDate) -> Option<f64> {
    let target = goal.target_date?;
    let start = goal.created_at.date_naive();
    let total = (target - start).num_days();
    if total <= 0 {
        return Some(if today >= target { 100.0 } else { 0.0 });
    }
    let elapsed = (today - start).num_days() as f64;
    Some((elapsed / total as f64 * 100.0).clamp(0.0, 100.0))
}

fn completed_days(sessions: &[JournalSession]) -> BTreeSet<NaiveDate> {
    sessions
        .iter()
        .filter(|s| s.is_completed)
        .map(|s| s.created_at.date_naive())
        .collect()
}

/// Consecutive days with a completed session, ending today.
/// A streak stays alive through today until midnight if yesterday was journaled.
pub fn current_streak(sessions: &[JournalSession], today: NaiveDate) -> u32 {
    let days = completed_days(sessions);
    let mut day = if days.contains(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) if days.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    while days.contains(&day) {
        streak += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}

pub fn longest_streak(sessions: &[JournalSession]) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut last: Option<NaiveDate> = None;
    for day in completed_days(sessions) {
        run = match last {
            Some(prev) if prev.succ_opt() == Some(day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        last = Some(day);
    }
    longest
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Award {
    FirstEntry,
    ThreeDayStreak,
    WeekStreak,
    MonthStreak,
    TenSessions,
    FiftySessions,
    HundredSessions,
}

enum Threshold {
    Sessions(usize),
    Streak(u32),
}

impl Award {
    pub const ALL: [Award; 7] = [
        Award::FirstEntry,
        Award::ThreeDayStreak,
        Award::WeekStreak,
        Award::MonthStreak,
        Award::TenSessions,
        Award::FiftySessions,
        Award::HundredSessions,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Award::FirstEntry => "First Entry",
            Award::ThreeDayStreak => "Three Day Streak",
            Award::WeekStreak => "One Week Streak",
            Award::MonthStreak => "One Month Streak",
            Award::TenSessions => "Ten Reflections",
            Award::FiftySessions => "Fifty Reflections",
            Award::HundredSessions => "One Hundred Reflections",
        }
    }

    fn threshold(self) -> Threshold {
        match self {
            Award::FirstEntry => Threshold::Sessions(1),
            Award::ThreeDayStreak => Threshold::Streak(3),
            Award::WeekStreak => Threshold::Streak(7),
            Award::MonthStreak => Threshold::Streak(30),
            Award::TenSessions => Threshold::Sessions(10),
            Award::FiftySessions => Threshold::Sessions(50),
            Award::HundredSessions => Threshold::Sessions(100),
        }
    }
}

/// Awards earned so far. Streak awards use the longest streak ever, so they are never lost.
pub fn unlocked_awards(sessions: &[JournalSession]) -> Vec<Award> {
    let completed = sessions.iter().filter(|s| s.is_completed).count();
    let best = longest_streak(sessions);
    Award::ALL
        .into_iter()
        .filter(|award| match award.threshold() {
            Threshold::Sessions(n) => completed >= n,
            Threshold::Streak(n) => best >= n,
        })
        .collect()
}
