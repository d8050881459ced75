//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::protocol::{
    BaselineRequest, ContextualRequest, GoalPayload, InterestPayload, MilestonesRequest,
    MilestonesResponse, OfflineRequest, ProgressionRequest, ProgressionResponse, PromptResponse,
    SessionKindDto, SessionPayload, StatusResponse, TimeOfDayDto, VisualizationRequest,
};
use crate::web::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use journal_core::engine::offline_prompt;
use journal_core::milestones::{current_streak, goal_progress, longest_streak, unlocked_awards};
use journal_core::{Goal, JournalSession, TimeOfDay, UserInterest};
use std::sync::Arc;
use tracing::error;
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        visualization_prompt_handler,
        offline_prompt_handler,
        baseline_prompt_handler,
        contextual_prompt_handler,
        check_progression_handler,
        status_handler,
        clear_cache_handler,
        milestones_handler,
    ),
    components(
        schemas(
            GoalPayload, InterestPayload, SessionPayload, SessionKindDto, TimeOfDayDto,
            VisualizationRequest, OfflineRequest, BaselineRequest, ContextualRequest,
            ProgressionRequest, MilestonesRequest, PromptResponse, ProgressionResponse,
            StatusResponse, MilestonesResponse
        )
    ),
    tags(
        (name = "Journal Prompt API", description = "Prompt generation, progression and milestones for goal journaling.")
    )
)]
pub struct ApiDoc;

type HandlerResult<T> = Result<T, (StatusCode, String)>;

fn parse_interest(payload: InterestPayload) -> HandlerResult<UserInterest> {
    UserInterest::try_from(payload).map_err(|e| (StatusCode::BAD_REQUEST, e))
}

fn time_of_day_or_now(dto: Option<TimeOfDayDto>) -> TimeOfDay {
    dto.map(TimeOfDay::from).unwrap_or_else(TimeOfDay::now)
}

//=========================================================================================
// Prompt Handlers
//=========================================================================================

/// Generate a visualization prompt for a goal.
///
/// Falls back to a static prompt when the goal has no vision, the backend is
/// unreachable or generation fails. Always answers with a prompt.
#[utoipa::path(
    post,
    path = "/prompts/visualization",
    request_body = VisualizationRequest,
    responses(
        (status = 200, description = "A visualization prompt", body = PromptResponse)
    )
)]
pub async fn visualization_prompt_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<VisualizationRequest>,
) -> impl IntoResponse {
    let goal = Goal::from(request.goal);
    let time_of_day = time_of_day_or_now(request.time_of_day);
    let at = request.requested_at.unwrap_or_else(Utc::now);

    let prompt = app_state
        .engine
        .visualization_prompt_at(&goal, time_of_day, at)
        .await;
    Json(PromptResponse { prompt })
}

/// Pick a keyword-matched offline prompt for a goal without calling the backend.
#[utoipa::path(
    post,
    path = "/prompts/offline",
    request_body = OfflineRequest,
    responses(
        (status = 200, description = "An offline prompt", body = PromptResponse)
    )
)]
pub async fn offline_prompt_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<OfflineRequest>,
) -> impl IntoResponse {
    let goal = Goal::from(request.goal);
    let prompt = match request.time_of_day {
        Some(dto) => offline_prompt(&goal, dto.into()),
        None => app_state.engine.generate_offline_prompt(&goal),
    };
    Json(PromptResponse { prompt })
}

/// Generate the opening self-reflection question for a new interest.
#[utoipa::path(
    post,
    path = "/prompts/baseline",
    request_body = BaselineRequest,
    responses(
        (status = 200, description = "A baseline question", body = PromptResponse),
        (status = 400, description = "Unknown category or invalid level")
    )
)]
pub async fn baseline_prompt_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<BaselineRequest>,
) -> HandlerResult<impl IntoResponse> {
    let interest = parse_interest(request.interest)?;
    let prompt = app_state.engine.generate_baseline_prompt(&interest).await;
    Ok(Json(PromptResponse { prompt }))
}

/// Generate today's prompt for an interest from its history and progression.
#[utoipa::path(
    post,
    path = "/prompts/contextual",
    request_body = ContextualRequest,
    responses(
        (status = 200, description = "A contextual prompt", body = PromptResponse),
        (status = 400, description = "Unknown category or invalid level")
    )
)]
pub async fn contextual_prompt_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<ContextualRequest>,
) -> HandlerResult<impl IntoResponse> {
    let interest = parse_interest(request.interest)?;
    let previous = request.previous_session.map(JournalSession::from);
    let sessions: Vec<JournalSession> =
        request.sessions.into_iter().map(JournalSession::from).collect();
    let is_evening = request
        .is_evening
        .unwrap_or_else(|| TimeOfDay::now().is_evening());

    let prompt = app_state
        .engine
        .generate_contextual_prompt(&interest, previous.as_ref(), &sessions, is_evening)
        .await;
    Ok(Json(PromptResponse { prompt }))
}

//=========================================================================================
// Progression and Milestones
//=========================================================================================

/// Record a progress score and report whether the interest should advance a level.
#[utoipa::path(
    post,
    path = "/progression/check",
    request_body = ProgressionRequest,
    responses(
        (status = 200, description = "The advancement decision", body = ProgressionResponse),
        (status = 400, description = "Invalid interest or score")
    )
)]
pub async fn check_progression_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<ProgressionRequest>,
) -> HandlerResult<impl IntoResponse> {
    if !(1..=10).contains(&request.score) {
        return Err((
            StatusCode::BAD_REQUEST,
            "score must be between 1 and 10".to_string(),
        ));
    }
    let mut interest = parse_interest(request.interest)?;
    let advance = app_state
        .engine
        .check_and_advance_level(&mut interest, request.score);

    let recommended_level = if advance {
        interest.advance_level()
    } else {
        interest.progression_level
    };
    Ok(Json(ProgressionResponse {
        advance,
        recent_scores: interest.recent_scores,
        recommended_level,
    }))
}

/// Compute goal progress, journaling streaks and unlocked awards.
#[utoipa::path(
    post,
    path = "/milestones",
    request_body = MilestonesRequest,
    responses(
        (status = 200, description = "Progress, streaks and awards", body = MilestonesResponse)
    )
)]
pub async fn milestones_handler(Json(request): Json<MilestonesRequest>) -> impl IntoResponse {
    let today = request.today.unwrap_or_else(|| Utc::now().date_naive());
    let sessions: Vec<JournalSession> =
        request.sessions.into_iter().map(JournalSession::from).collect();

    let goal_progress = request
        .goal
        .map(Goal::from)
        .and_then(|goal| goal_progress(&goal, today));

    Json(MilestonesResponse {
        goal_progress,
        current_streak: current_streak(&sessions, today),
        longest_streak: longest_streak(&sessions),
        awards: unlocked_awards(&sessions)
            .into_iter()
            .map(|award| award.title().to_string())
            .collect(),
    })
}

//=========================================================================================
// Engine Status and Cache
//=========================================================================================

/// Report whether a generation is in flight and the last user-visible error.
#[utoipa::path(
    get,
    path = "/status",
    responses(
        (status = 200, description = "Engine status", body = StatusResponse)
    )
)]
pub async fn status_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = app_state.engine.status();
    Json(StatusResponse {
        is_busy: status.is_busy,
        last_error: status.last_error.map(|e| e.user_message().to_string()),
        model: app_state.engine.config().model.clone(),
        backend_configured: app_state.config.openai_api_key.is_some(),
    })
}

/// Drop every cached prompt.
#[utoipa::path(
    delete,
    path = "/cache",
    responses(
        (status = 204, description = "Cache cleared"),
        (status = 500, description = "The cache store failed")
    )
)]
pub async fn clear_cache_handler(
    State(app_state): State<Arc<AppState>>,
) -> HandlerResult<impl IntoResponse> {
    match app_state.engine.clear_cache().await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to clear prompt cache: {:?}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to clear prompt cache".to_string(),
            ))
        }
    }
}
