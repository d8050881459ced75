//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged with clients of the REST API and their
//! conversions into the core domain types.

use chrono::{DateTime, NaiveDate, Utc};
use journal_core::domain::{MAX_LEVEL, MIN_LEVEL, SCORE_WINDOW};
use journal_core::{Goal, InterestCategory, JournalSession, SessionKind, TimeOfDay, UserInterest};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Domain Payloads
//=========================================================================================

#[derive(Deserialize, Serialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDayDto {
    Morning,
    Evening,
}

impl From<TimeOfDayDto> for TimeOfDay {
    fn from(dto: TimeOfDayDto) -> Self {
        match dto {
            TimeOfDayDto::Morning => TimeOfDay::Morning,
            TimeOfDayDto::Evening => TimeOfDay::Evening,
        }
    }
}

/// A goal as the client stores it. A missing id is generated on the fly.
#[derive(Deserialize, ToSchema, Debug, Clone)]
pub struct GoalPayload {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub text: String,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub vision: Option<String>,
    #[serde(default)]
    pub current_prompt: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<GoalPayload> for Goal {
    fn from(payload: GoalPayload) -> Self {
        let mut goal = Goal::new(payload.text);
        if let Some(id) = payload.id {
            goal.id = id;
        }
        if let Some(created_at) = payload.created_at {
            goal.created_at = created_at;
        }
        goal.target_date = payload.target_date;
        goal.vision = payload.vision;
        goal.current_prompt = payload.current_prompt;
        goal
    }
}

/// An interest with its progression state. `category` is a tag such as `"diet"` or `"career"`.
#[derive(Deserialize, ToSchema, Debug, Clone)]
pub struct InterestPayload {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub progression_level: Option<u8>,
    #[serde(default)]
    pub recent_scores: Vec<u8>,
    #[serde(default)]
    pub baseline_responses: Vec<String>,
    #[serde(default)]
    pub diet_goals: Vec<String>,
    #[serde(default)]
    pub nutrition_focus: Vec<String>,
}

impl TryFrom<InterestPayload> for UserInterest {
    type Error = String;

    fn try_from(payload: InterestPayload) -> Result<Self, Self::Error> {
        let category = InterestCategory::from_tag(&payload.category)
            .ok_or_else(|| format!("Unknown interest category '{}'", payload.category))?;
        let level = payload.progression_level.unwrap_or(MIN_LEVEL);
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
            return Err(format!(
                "progression_level must be between {} and {}",
                MIN_LEVEL, MAX_LEVEL
            ));
        }

        let mut interest = UserInterest::new(category);
        if let Some(id) = payload.id {
            interest.id = id;
        }
        interest.subcategory = payload.subcategory;
        interest.description = payload.description;
        interest.progression_level = level;
        for score in payload.recent_scores.into_iter().rev().take(SCORE_WINDOW).rev() {
            interest.record_score(score);
        }
        interest.baseline_responses = payload.baseline_responses;
        interest.diet_goals = payload.diet_goals;
        interest.nutrition_focus = payload.nutrition_focus;
        Ok(interest)
    }
}

#[derive(Deserialize, Serialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionKindDto {
    Baseline,
    DailyAlignment,
    DailyReview,
    WeeklyReview,
}

impl From<SessionKindDto> for SessionKind {
    fn from(dto: SessionKindDto) -> Self {
        match dto {
            SessionKindDto::Baseline => SessionKind::Baseline,
            SessionKindDto::DailyAlignment => SessionKind::DailyAlignment,
            SessionKindDto::DailyReview => SessionKind::DailyReview,
            SessionKindDto::WeeklyReview => SessionKind::WeeklyReview,
        }
    }
}

/// A journaling session from the client's history.
#[derive(Deserialize, ToSchema, Debug, Clone)]
pub struct SessionPayload {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub interest_id: Option<Uuid>,
    #[serde(default)]
    pub goal_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub kind: SessionKindDto,
    #[serde(default)]
    pub prompt_text: String,
    #[serde(default)]
    pub response_text: String,
    #[serde(default)]
    pub progress_score: Option<u8>,
    #[serde(default)]
    pub is_completed: bool,
}

impl From<SessionPayload> for JournalSession {
    fn from(payload: SessionPayload) -> Self {
        let mut session =
            JournalSession::new(payload.kind.into(), payload.prompt_text, payload.created_at);
        if let Some(id) = payload.id {
            session.id = id;
        }
        session.interest_id = payload.interest_id;
        session.goal_id = payload.goal_id;
        session.response_text = payload.response_text;
        session.progress_score = payload.progress_score.map(|s| s.clamp(1, 10));
        session.is_completed = payload.is_completed;
        session
    }
}

//=========================================================================================
// Request Bodies
//=========================================================================================

#[derive(Deserialize, ToSchema, Debug)]
pub struct VisualizationRequest {
    pub goal: GoalPayload,
    /// Defaults to the server's local time of day.
    #[serde(default)]
    pub time_of_day: Option<TimeOfDayDto>,
    /// Call timestamp used in the cache key. Repeating it returns the cached prompt.
    #[serde(default)]
    pub requested_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct OfflineRequest {
    pub goal: GoalPayload,
    #[serde(default)]
    pub time_of_day: Option<TimeOfDayDto>,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct BaselineRequest {
    pub interest: InterestPayload,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct ContextualRequest {
    pub interest: InterestPayload,
    #[serde(default)]
    pub previous_session: Option<SessionPayload>,
    #[serde(default)]
    pub sessions: Vec<SessionPayload>,
    /// Defaults to the server's local time of day.
    #[serde(default)]
    pub is_evening: Option<bool>,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct ProgressionRequest {
    pub interest: InterestPayload,
    /// The newest progress score, 1 to 10.
    pub score: u8,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct MilestonesRequest {
    #[serde(default)]
    pub goal: Option<GoalPayload>,
    #[serde(default)]
    pub sessions: Vec<SessionPayload>,
    /// Defaults to the current UTC date.
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

//=========================================================================================
// Response Bodies
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct PromptResponse {
    pub prompt: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ProgressionResponse {
    /// Whether the interest is ready for the next level.
    pub advance: bool,
    /// The updated rolling score window, oldest first.
    pub recent_scores: Vec<u8>,
    /// The level the client should store for this interest.
    pub recommended_level: u8,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct StatusResponse {
    pub is_busy: bool,
    /// User-visible message describing the last failed generation, if any.
    pub last_error: Option<String>,
    pub model: String,
    /// False when the service runs without a generation backend.
    pub backend_configured: bool,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct MilestonesResponse {
    /// Percentage from goal creation to target date, when both are known.
    pub goal_progress: Option<f64>,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub awards: Vec<String>,
}
