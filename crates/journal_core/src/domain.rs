//! crates/journal_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Local, NaiveDate, Timelike, Utc};
use uuid::Uuid;

/// Lowest progression level an interest can hold.
pub const MIN_LEVEL: u8 = 1;
/// Highest progression level an interest can reach.
pub const MAX_LEVEL: u8 = 10;
/// Number of recent scores kept in an interest's rolling window.
pub const SCORE_WINDOW: usize = 7;

/// A goal the user is visualizing and journaling towards.
#[derive(Debug, Clone)]
pub struct Goal {
    pub id: Uuid,
    pub text: String,
    pub target_date: Option<NaiveDate>,
    /// The user's own description of the outcome. Generation is only attempted when present.
    pub vision: Option<String>,
    pub current_prompt: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Goal {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            target_date: None,
            vision: None,
            current_prompt: None,
            created_at: Utc::now(),
        }
    }

    /// The vision text, if it holds anything besides whitespace.
    pub fn vision_text(&self) -> Option<&str> {
        self.vision
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// Morning prompts look ahead, evening prompts look back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeOfDay {
    Morning,
    Evening,
}

impl TimeOfDay {
    /// Hours before noon are morning, everything after is evening.
    pub fn from_hour(hour: u32) -> Self {
        if hour < 12 {
            TimeOfDay::Morning
        } else {
            TimeOfDay::Evening
        }
    }

    pub fn from_evening_flag(is_evening: bool) -> Self {
        if is_evening {
            TimeOfDay::Evening
        } else {
            TimeOfDay::Morning
        }
    }

    /// Based on the local wall clock.
    pub fn now() -> Self {
        Self::from_hour(Local::now().hour())
    }

    pub fn is_evening(self) -> bool {
        self == TimeOfDay::Evening
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Evening => "evening",
        }
    }
}

/// The life area an interest belongs to. Each category owns its own set of static prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterestCategory {
    Diet,
    Fitness,
    Career,
    Relationships,
    Finances,
    Mindfulness,
    Creativity,
    Custom,
}

impl InterestCategory {
    pub const ALL: [InterestCategory; 8] = [
        InterestCategory::Diet,
        InterestCategory::Fitness,
        InterestCategory::Career,
        InterestCategory::Relationships,
        InterestCategory::Finances,
        InterestCategory::Mindfulness,
        InterestCategory::Creativity,
        InterestCategory::Custom,
    ];

    /// Stable tag used on the wire and in storage.
    pub fn tag(self) -> &'static str {
        match self {
            InterestCategory::Diet => "diet",
            InterestCategory::Fitness => "fitness",
            InterestCategory::Career => "career",
            InterestCategory::Relationships => "relationships",
            InterestCategory::Finances => "finances",
            InterestCategory::Mindfulness => "mindfulness",
            InterestCategory::Creativity => "creativity",
            InterestCategory::Custom => "custom",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InterestCategory::Diet => "Health & Diet",
            InterestCategory::Fitness => "Fitness",
            InterestCategory::Career => "Career",
            InterestCategory::Relationships => "Relationships",
            InterestCategory::Finances => "Finances",
            InterestCategory::Mindfulness => "Mindfulness",
            InterestCategory::Creativity => "Creativity",
            InterestCategory::Custom => "Personal Focus",
        }
    }

    /// Parses a tag case-insensitively. `"health"` is accepted as an alias for diet.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_lowercase();
        if tag == "health" {
            return Some(InterestCategory::Diet);
        }
        Self::ALL.into_iter().find(|c| c.tag() == tag)
    }
}

/// An area of focus the user journals about, with its progression state.
#[derive(Debug, Clone)]
pub struct UserInterest {
    pub id: Uuid,
    pub category: InterestCategory,
    pub subcategory: Option<String>,
    pub description: Option<String>,
    pub progression_level: u8,
    /// The most recent progress scores, oldest first, never longer than `SCORE_WINDOW`.
    pub recent_scores: Vec<u8>,
    pub baseline_responses: Vec<String>,
    // Diet-specific progression details.
    pub diet_goals: Vec<String>,
    pub nutrition_focus: Vec<String>,
}

impl UserInterest {
    pub fn new(category: InterestCategory) -> Self {
        Self {
            id: Uuid::new_v4(),
            category,
            subcategory: None,
            description: None,
            progression_level: MIN_LEVEL,
            recent_scores: Vec::new(),
            baseline_responses: Vec::new(),
            diet_goals: Vec::new(),
            nutrition_focus: Vec::new(),
        }
    }

    /// Appends a score and drops the oldest entries beyond the window.
    pub fn record_score(&mut self, score: u8) {
        self.recent_scores.push(score.clamp(1, 10));
        if self.recent_scores.len() > SCORE_WINDOW {
            let excess = self.recent_scores.len() - SCORE_WINDOW;
            self.recent_scores.drain(..excess);
        }
    }

    /// Applies an advancement recommendation. Returns the new level.
    pub fn advance_level(&mut self) -> u8 {
        self.progression_level = self
            .progression_level
            .saturating_add(1)
            .clamp(MIN_LEVEL, MAX_LEVEL);
        self.progression_level
    }

    /// Explicit external reset, the only way the level goes down.
    pub fn reset_level(&mut self) {
        self.progression_level = MIN_LEVEL;
        self.recent_scores.clear();
    }

    pub fn baseline_text(&self) -> String {
        self.baseline_responses
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    Baseline,
    DailyAlignment,
    DailyReview,
    WeeklyReview,
}

impl SessionKind {
    pub fn label(self) -> &'static str {
        match self {
            SessionKind::Baseline => "baseline reflection",
            SessionKind::DailyAlignment => "morning alignment",
            SessionKind::DailyReview => "evening review",
            SessionKind::WeeklyReview => "weekly review",
        }
    }

    /// The part of the day a session kind belongs to, if any.
    pub fn time_of_day(self) -> Option<TimeOfDay> {
        match self {
            SessionKind::DailyAlignment => Some(TimeOfDay::Morning),
            SessionKind::DailyReview => Some(TimeOfDay::Evening),
            SessionKind::Baseline | SessionKind::WeeklyReview => None,
        }
    }
}

/// A single journaling exchange.
/// Only the response, score and completion flag change after creation.
#[derive(Debug, Clone)]
pub struct JournalSession {
    pub id: Uuid,
    pub interest_id: Option<Uuid>,
    pub goal_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub kind: SessionKind,
    pub prompt_text: String,
    pub response_text: String,
    pub progress_score: Option<u8>,
    pub is_completed: bool,
}

impl JournalSession {
    pub fn new(
        kind: SessionKind,
        prompt_text: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            interest_id: None,
            goal_id: None,
            created_at,
            kind,
            prompt_text: prompt_text.into(),
            response_text: String::new(),
            progress_score: None,
            is_completed: false,
        }
    }

    pub fn for_interest(mut self, interest_id: Uuid) -> Self {
        self.interest_id = Some(interest_id);
        self
    }

    pub fn complete(&mut self, response_text: impl Into<String>, score: Option<u8>) {
        self.response_text = response_text.into();
        self.progress_score = score.map(|s| s.clamp(1, 10));
        self.is_completed = true;
    }
}
