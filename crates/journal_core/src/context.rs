//! crates/journal_core/src/context.rs
//!
//! Builds the text summaries that seed a contextual prompt: what the interest is,
//! what the user has written so far, where they are in their progression, and
//! what patterns show up in their history.

use crate::domain::{InterestCategory, JournalSession, TimeOfDay, UserInterest, SCORE_WINDOW};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

const BASELINE_EXCERPT_CHARS: usize = 200;
const RECENT_EXCERPT_CHARS: usize = 100;
const PREVIOUS_EXCERPT_CHARS: usize = 150;
const RECENT_SESSION_COUNT: usize = 3;
/// Minimum number of scores before a trend is reported.
const TREND_MIN_SCORES: usize = 5;
const TREND_THRESHOLD: f64 = 0.5;
const TOP_WORD_COUNT: usize = 3;

const STOP_WORDS: &[&str] = &[
    "about", "after", "again", "also", "because", "been", "before", "being", "could", "didn't",
    "does", "doing", "don't", "each", "even", "from", "going", "have", "having", "here", "into",
    "just", "know", "like", "made", "make", "more", "much", "need", "only", "other", "really",
    "some", "still", "than", "that", "their", "them", "then", "there", "these", "they", "thing",
    "things", "think", "this", "those", "through", "today", "very", "want", "were", "what",
    "when", "where", "which", "while", "will", "with", "would", "your",
];

//=========================================================================================
// Text Helpers
//=========================================================================================

/// The first `max` characters of `text`, with an ellipsis when something was cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(max).collect();
    out.push_str("...");
    out
}

/// The last `max` characters of `text`.
pub fn tail_chars(text: &str, max: usize) -> String {
    let count = text.chars().count();
    text.chars().skip(count.saturating_sub(max)).collect()
}

pub fn relative_day_label(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now.date_naive() - then.date_naive()).num_days();
    match days {
        i64::MIN..=0 => "today".to_string(),
        1 => "yesterday".to_string(),
        n => format!("{} days ago", n),
    }
}

//=========================================================================================
// Summaries
//=========================================================================================

/// Category, subcategory and free-text description joined into one readable line.
pub fn interest_description(interest: &UserInterest) -> String {
    let mut description = interest.category.label().to_string();
    if let Some(sub) = interest.subcategory.as_deref().filter(|s| !s.trim().is_empty()) {
        description.push_str(" - ");
        description.push_str(sub.trim());
    }
    if let Some(text) = interest.description.as_deref().filter(|s| !s.trim().is_empty()) {
        description.push_str(": ");
        description.push_str(text.trim());
    }
    description
}

/// Sessions that belong to `interest`, oldest first.
pub fn sessions_for_interest<'a>(
    interest: &UserInterest,
    sessions: &'a [JournalSession],
) -> Vec<&'a JournalSession> {
    let mut matching: Vec<&JournalSession> = sessions
        .iter()
        .filter(|s| s.interest_id == Some(interest.id))
        .collect();
    matching.sort_by_key(|s| s.created_at);
    matching
}

pub fn context_summary(
    interest: &UserInterest,
    previous: Option<&JournalSession>,
    sessions: &[JournalSession],
    now: DateTime<Utc>,
) -> String {
    let baseline = interest.baseline_text();
    let history: Vec<&JournalSession> = sessions_for_interest(interest, sessions)
        .into_iter()
        .filter(|s| !s.response_text.trim().is_empty())
        .collect();

    if baseline.is_empty() && history.is_empty() && previous.is_none() {
        return "This is a new area of focus for the user. There is no journaling history yet."
            .to_string();
    }

    let mut lines = Vec::new();
    if !baseline.is_empty() {
        lines.push(format!(
            "Baseline reflection: \"{}\"",
            truncate_chars(&baseline, BASELINE_EXCERPT_CHARS)
        ));
    }

    if !history.is_empty() {
        lines.push("Recent entries:".to_string());
        for session in history.iter().rev().take(RECENT_SESSION_COUNT) {
            let mut line = format!(
                "- {}: \"{}\"",
                relative_day_label(session.created_at, now),
                truncate_chars(&session.response_text, RECENT_EXCERPT_CHARS)
            );
            if let Some(score) = session.progress_score {
                line.push_str(&format!(" (progress score {}/10)", score));
            }
            lines.push(line);
        }
    }

    if let Some(prev) = previous.filter(|p| !p.response_text.trim().is_empty()) {
        lines.push(format!(
            "Previous {}: \"{}\"",
            prev.kind.label(),
            truncate_chars(&prev.response_text, PREVIOUS_EXCERPT_CHARS)
        ));
    }

    lines.join("\n")
}

pub fn progression_summary(interest: &UserInterest) -> String {
    let mut lines = vec![format!(
        "Current progression level: {}/10",
        interest.progression_level
    )];

    if interest.category == InterestCategory::Diet {
        if !interest.diet_goals.is_empty() {
            lines.push(format!("Diet goals: {}", interest.diet_goals.join(", ")));
        }
        if !interest.nutrition_focus.is_empty() {
            lines.push(format!(
                "Nutrition focus: {}",
                interest.nutrition_focus.join(", ")
            ));
        }
        if let Some(avg) = average(&interest.recent_scores) {
            lines.push(format!("Weekly average score: {:.1}/10", avg));
        }
    }

    lines.join("\n")
}

//=========================================================================================
// Learning Insights
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

impl Trend {
    pub fn label(self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Stable => "stable",
        }
    }
}

pub fn average(scores: &[u8]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let sum: u32 = scores.iter().map(|&s| u32::from(s)).sum();
    Some(f64::from(sum) / scores.len() as f64)
}

/// Compares the first and second half of the trailing window. Needs at least five scores.
pub fn score_trend(scores: &[u8]) -> Option<Trend> {
    let window = &scores[scores.len().saturating_sub(SCORE_WINDOW)..];
    if window.len() < TREND_MIN_SCORES {
        return None;
    }
    let (first, second) = window.split_at(window.len() / 2);
    let delta = average(second)? - average(first)?;
    Some(if delta > TREND_THRESHOLD {
        Trend::Improving
    } else if delta < -TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    })
}

/// Most frequent words longer than three letters, ignoring stop-words. Ties break alphabetically.
pub fn top_words<'a>(texts: impl IntoIterator<Item = &'a str>, limit: usize) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for text in texts {
        for word in text.split(|c: char| !c.is_alphanumeric() && c != '\'') {
            let word = word.trim_matches('\'').to_lowercase();
            if word.chars().count() > 3 && !STOP_WORDS.contains(&word.as_str()) {
                *counts.entry(word).or_insert(0) += 1;
            }
        }
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(limit).map(|(w, _)| w).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct LearningInsights {
    pub average_score: Option<f64>,
    pub scores_considered: usize,
    pub trend: Option<Trend>,
    pub top_words: Vec<String>,
    pub morning_sessions: usize,
    pub evening_sessions: usize,
}

impl LearningInsights {
    pub fn from_history(interest: &UserInterest, sessions: &[JournalSession]) -> Self {
        let history = sessions_for_interest(interest, sessions);

        let scores: Vec<u8> = history.iter().filter_map(|s| s.progress_score).collect();
        let window = &scores[scores.len().saturating_sub(SCORE_WINDOW)..];

        let count_at = |tod: TimeOfDay| {
            history
                .iter()
                .filter(|s| s.kind.time_of_day() == Some(tod))
                .count()
        };

        Self {
            average_score: average(window),
            scores_considered: window.len(),
            trend: score_trend(window),
            top_words: top_words(history.iter().map(|s| s.response_text.as_str()), TOP_WORD_COUNT),
            morning_sessions: count_at(TimeOfDay::Morning),
            evening_sessions: count_at(TimeOfDay::Evening),
        }
    }

    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        match self.average_score {
            Some(avg) => {
                let trend = self
                    .trend
                    .map(Trend::label)
                    .unwrap_or("not enough data for a trend");
                lines.push(format!(
                    "Average progress score over the last {} entries: {:.1}/10 ({})",
                    self.scores_considered, avg, trend
                ));
            }
            None => lines.push("No progress scores recorded yet.".to_string()),
        }
        if !self.top_words.is_empty() {
            lines.push(format!("Recurring themes: {}", self.top_words.join(", ")));
        }
        lines.push(format!(
            "Sessions so far: {} morning, {} evening",
            self.morning_sessions, self.evening_sessions
        ));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SessionKind;
    use chrono::Duration;

    fn session(
        interest: &UserInterest,
        kind: SessionKind,
        days_ago: i64,
        response: &str,
        score: Option<u8>,
        now: DateTime<Utc>,
    ) -> JournalSession {
        let mut s = JournalSession::new(kind, "prompt", now - Duration::days(days_ago))
            .for_interest(interest.id);
        s.complete(response, score);
        s
    }

    #[test]
    fn trend_labels_follow_half_averages() {
        assert_eq!(score_trend(&[5, 5, 5, 8, 8, 8]), Some(Trend::Improving));
        assert_eq!(score_trend(&[8, 8, 8, 5, 5, 5]), Some(Trend::Declining));
        assert_eq!(score_trend(&[7, 7, 7, 7, 7, 8]), Some(Trend::Stable));
        assert_eq!(score_trend(&[1, 2, 10, 10]), None);
    }

    #[test]
    fn trend_uses_trailing_window_only() {
        // The leading 1s fall outside the seven most recent scores.
        let scores = [1, 1, 1, 7, 7, 7, 7, 7, 7, 7];
        assert_eq!(score_trend(&scores), Some(Trend::Stable));
    }

    #[test]
    fn top_words_skip_short_and_stop_words() {
        let texts = [
            "Cooking dinner felt calm. Cooking is grounding.",
            "Walking after dinner, cooking again with family",
            "That was really good and it was with family",
        ];
        let words = top_words(texts, 3);
        assert_eq!(words, vec!["cooking", "dinner", "family"]);
    }

    #[test]
    fn new_interest_context_says_new_focus() {
        let interest = UserInterest::new(InterestCategory::Career);
        let summary = context_summary(&interest, None, &[], Utc::now());
        assert!(summary.contains("new area of focus"));
    }

    #[test]
    fn context_summary_lists_three_latest_entries() {
        let now = Utc::now();
        let mut interest = UserInterest::new(InterestCategory::Fitness);
        interest.baseline_responses = vec!["x".repeat(300)];
        let sessions: Vec<JournalSession> = (1..=5)
            .map(|d| {
                session(
                    &interest,
                    SessionKind::DailyReview,
                    d,
                    &format!("entry from {} days back", d),
                    Some(6),
                    now,
                )
            })
            .collect();

        let summary = context_summary(&interest, sessions.first(), &sessions, now);
        assert!(summary.contains("yesterday"));
        assert!(summary.contains("2 days ago"));
        assert!(summary.contains("3 days ago"));
        assert!(!summary.contains("4 days ago"));
        assert!(summary.contains("(progress score 6/10)"));
        assert!(summary.contains("Previous evening review"));
        // 200 baseline chars plus the ellipsis.
        assert!(summary.contains(&format!("\"{}...\"", "x".repeat(200))));
    }

    #[test]
    fn progression_summary_adds_diet_details() {
        let mut interest = UserInterest::new(InterestCategory::Diet);
        interest.progression_level = 4;
        interest.diet_goals = vec!["less sugar".to_string()];
        interest.nutrition_focus = vec!["protein".to_string(), "fiber".to_string()];
        interest.recent_scores = vec![6, 8];

        let summary = progression_summary(&interest);
        assert!(summary.contains("4/10"));
        assert!(summary.contains("less sugar"));
        assert!(summary.contains("protein, fiber"));
        assert!(summary.contains("7.0/10"));

        let career = UserInterest::new(InterestCategory::Career);
        assert!(!progression_summary(&career).contains("Nutrition"));
    }

    #[test]
    fn insights_count_sessions_by_time_of_day() {
        let now = Utc::now();
        let interest = UserInterest::new(InterestCategory::Mindfulness);
        let other = UserInterest::new(InterestCategory::Career);
        let sessions = vec![
            session(&interest, SessionKind::DailyAlignment, 6, "breathing", Some(5), now),
            session(&interest, SessionKind::DailyAlignment, 5, "breathing", Some(5), now),
            session(&interest, SessionKind::DailyReview, 4, "walking", Some(5), now),
            session(&interest, SessionKind::DailyReview, 3, "breathing", Some(8), now),
            session(&interest, SessionKind::WeeklyReview, 2, "walking", Some(8), now),
            session(&interest, SessionKind::DailyReview, 1, "calm", Some(8), now),
            session(&other, SessionKind::DailyReview, 1, "meetings", Some(1), now),
        ];

        let insights = LearningInsights::from_history(&interest, &sessions);
        assert_eq!(insights.morning_sessions, 2);
        assert_eq!(insights.evening_sessions, 3);
        assert_eq!(insights.scores_considered, 6);
        assert_eq!(insights.trend, Some(Trend::Improving));
        assert_eq!(insights.top_words, vec!["breathing", "walking", "calm"]);
        assert!(insights.summary().contains("improving"));
    }

    #[test]
    fn truncation_is_char_safe() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo...");
        assert_eq!(tail_chars("héllo wörld", 5), "wörld");
        assert_eq!(truncate_chars("short", 10), "short");
    }
}
