//! crates/journal_core/src/engine.rs
//!
//! The prompt engine. It prefers the generative backend, falls back to the
//! static prompt banks whenever generation is unavailable or fails, and never
//! surfaces a failure to its caller.

use crate::context::{
    context_summary, interest_description, progression_summary, tail_chars, LearningInsights,
};
use crate::domain::{Goal, JournalSession, TimeOfDay, UserInterest};
use crate::fallback::{category_prompts, offline_template, random_pool_prompt};
use crate::ports::{
    BackendError, ChatMessage, ConnectivityProbe, GenerationRequest, KeyValueCache, PortResult,
    TextGenerationBackend,
};
use crate::progression;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};
use uuid::Uuid;

const VISION_TAIL_CHARS: usize = 1000;
const NO_TARGET_DATE: &str = "the future";

const VISUALIZATION_INSTRUCTIONS: &str = "You are a visualization coach inside a goal journaling app. \
Write ONE vivid, second-person visualization prompt of two or three sentences that helps the user \
picture themselves having achieved their goal. Draw on the details of their vision. \
Respond with ONLY the prompt, no quotes, no preamble.";

const BASELINE_INSTRUCTIONS: &str = "You are a thoughtful journaling coach. The user has just chosen a new \
area of focus. Ask ONE open-ended self-reflection question that helps them describe where they are \
starting from and what they hope will change. Respond with ONLY the question.";

const CONTEXTUAL_INSTRUCTIONS: &str = "You are a journaling coach writing today's prompt for a user you have \
been working with. Reference specific details from their history, build on their current progression \
level so the prompt is a little more sophisticated than the last one, and adapt your tone: forward-looking \
and energising in the morning, reflective and calm in the evening. Respond with ONE question only.";

//=========================================================================================
// Configuration, Cache Keys and Status
//=========================================================================================

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub model: String,
    pub visualization_max_tokens: u32,
    pub baseline_max_tokens: u32,
    /// Must stay below `baseline_max_tokens`. `PromptEngine::new` lowers it otherwise.
    pub contextual_max_tokens: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            visualization_max_tokens: 150,
            baseline_max_tokens: 200,
            contextual_max_tokens: 150,
        }
    }
}

/// Identifies one generated prompt: the context it was made for plus the call timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_goal(goal_id: Uuid, at: DateTime<Utc>) -> Self {
        Self(format!("goal_{}_{}", goal_id, at.timestamp_millis()))
    }

    pub fn for_interest(interest_id: Uuid, purpose: &str, at: DateTime<Utc>) -> Self {
        Self(format!(
            "interest_{}_{}_{}",
            interest_id,
            purpose,
            at.timestamp_millis()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The user-visible side of a failed generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptError {
    NoConnectivity,
    ServiceError,
    EmptyResponse,
}

impl PromptError {
    pub fn user_message(self) -> &'static str {
        match self {
            PromptError::NoConnectivity => {
                "No internet connection. Showing an offline prompt instead."
            }
            PromptError::ServiceError => {
                "The prompt service is unavailable right now. Showing a saved prompt instead."
            }
            PromptError::EmptyResponse => {
                "The prompt service returned nothing. Showing a saved prompt instead."
            }
        }
    }
}

impl From<&BackendError> for PromptError {
    fn from(err: &BackendError) -> Self {
        match err {
            BackendError::Unreachable => PromptError::NoConnectivity,
            BackendError::EmptyResponse => PromptError::EmptyResponse,
            BackendError::Transport(_) | BackendError::Status { .. } | BackendError::Decode(_) => {
                PromptError::ServiceError
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStatus {
    pub is_busy: bool,
    pub last_error: Option<PromptError>,
}

/// Raises the busy count for as long as it lives.
struct BusyGuard<'a>(&'a AtomicUsize);

impl<'a> BusyGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

//=========================================================================================
// The Engine
//=========================================================================================

/// Builds journal prompts. Constructed once at startup and shared behind an `Arc`.
pub struct PromptEngine {
    backend: Arc<dyn TextGenerationBackend>,
    cache: Arc<dyn KeyValueCache>,
    connectivity: Arc<dyn ConnectivityProbe>,
    config: EngineConfig,
    in_flight: AtomicUsize,
    last_error: Mutex<Option<PromptError>>,
}

impl PromptEngine {
    pub fn new(
        backend: Arc<dyn TextGenerationBackend>,
        cache: Arc<dyn KeyValueCache>,
        connectivity: Arc<dyn ConnectivityProbe>,
        mut config: EngineConfig,
    ) -> Self {
        if config.contextual_max_tokens >= config.baseline_max_tokens {
            let lowered = config.baseline_max_tokens.saturating_sub(1).max(1);
            warn!(
                requested = config.contextual_max_tokens,
                baseline = config.baseline_max_tokens,
                "Contextual token ceiling must be below the baseline ceiling, using {}",
                lowered
            );
            config.contextual_max_tokens = lowered;
        }
        Self {
            backend,
            cache,
            connectivity,
            config,
            in_flight: AtomicUsize::new(0),
            last_error: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn last_error(&self) -> Option<PromptError> {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            is_busy: self.is_busy(),
            last_error: self.last_error(),
        }
    }

    fn set_error(&self, error: Option<PromptError>) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = error;
    }

    // --- Visualization prompts ---

    pub async fn generate_visualization_prompt(
        &self,
        goal: &Goal,
        time_of_day: TimeOfDay,
    ) -> String {
        self.visualization_prompt_at(goal, time_of_day, Utc::now()).await
    }

    /// Same as [`Self::generate_visualization_prompt`] with an explicit call timestamp,
    /// which together with the goal id forms the cache key.
    pub async fn visualization_prompt_at(
        &self,
        goal: &Goal,
        time_of_day: TimeOfDay,
        at: DateTime<Utc>,
    ) -> String {
        let _busy = BusyGuard::enter(&self.in_flight);

        let Some(vision) = goal.vision_text() else {
            debug!(goal_id = %goal.id, "No vision text, using {} pool", time_of_day.as_str());
            return random_pool_prompt(time_of_day).to_string();
        };
        if !self.connectivity.is_reachable().await {
            debug!(goal_id = %goal.id, "Offline, using {} pool", time_of_day.as_str());
            return random_pool_prompt(time_of_day).to_string();
        }

        let target = goal
            .target_date
            .map(|d| d.format("%B %-d, %Y").to_string())
            .unwrap_or_else(|| NO_TARGET_DATE.to_string());
        let moment = match time_of_day {
            TimeOfDay::Morning => {
                "It is morning: help them start the day already living their goal."
            }
            TimeOfDay::Evening => {
                "It is evening: help them reflect and rest with their goal in mind."
            }
        };
        let request = self.request(
            vec![
                ChatMessage::system(VISUALIZATION_INSTRUCTIONS),
                ChatMessage::user(format!(
                    "GOAL: {}\nTARGET DATE: {}\nVISION: {}\nTIME OF DAY: {}\n\n{}",
                    goal.text.trim(),
                    target,
                    tail_chars(vision, VISION_TAIL_CHARS),
                    time_of_day.as_str(),
                    moment
                )),
            ],
            self.config.visualization_max_tokens,
        );

        let key = CacheKey::for_goal(goal.id, at);
        self.generate_or(&key, request, || random_pool_prompt(time_of_day))
            .await
    }

    /// Picks a template from the goal's wording without touching the backend.
    pub fn generate_offline_prompt(&self, goal: &Goal) -> String {
        offline_prompt(goal, TimeOfDay::now())
    }

    // --- Interest prompts ---

    pub async fn generate_baseline_prompt(&self, interest: &UserInterest) -> String {
        let _busy = BusyGuard::enter(&self.in_flight);
        let fallback = || category_prompts(interest.category).baseline_fallback();

        if !self.connectivity.is_reachable().await {
            debug!(interest_id = %interest.id, "Offline, using baseline fallback");
            return fallback().to_string();
        }

        let request = self.request(
            vec![
                ChatMessage::system(BASELINE_INSTRUCTIONS),
                ChatMessage::user(format!(
                    "The user wants to focus on: {}",
                    interest_description(interest)
                )),
            ],
            self.config.baseline_max_tokens,
        );
        let key = CacheKey::for_interest(interest.id, "baseline", Utc::now());
        self.generate_or(&key, request, fallback).await
    }

    pub async fn generate_contextual_prompt(
        &self,
        interest: &UserInterest,
        previous: Option<&JournalSession>,
        sessions: &[JournalSession],
        is_evening: bool,
    ) -> String {
        let _busy = BusyGuard::enter(&self.in_flight);
        let time_of_day = TimeOfDay::from_evening_flag(is_evening);
        let fallback = || {
            category_prompts(interest.category)
                .contextual_fallback(interest.progression_level, time_of_day)
        };

        if !self.connectivity.is_reachable().await {
            debug!(interest_id = %interest.id, "Offline, using contextual fallback");
            return fallback().to_string();
        }

        let now = Utc::now();
        let insights = LearningInsights::from_history(interest, sessions);
        let user_message = format!(
            "FOCUS AREA:\n{}\n\nHISTORY:\n{}\n\nPROGRESSION:\n{}\n\nLEARNING INSIGHTS:\n{}\n\nIt is {}. Write today's prompt.",
            interest_description(interest),
            context_summary(interest, previous, sessions, now),
            progression_summary(interest),
            insights.summary(),
            time_of_day.as_str()
        );
        let request = self.request(
            vec![
                ChatMessage::system(CONTEXTUAL_INSTRUCTIONS),
                ChatMessage::user(user_message),
            ],
            self.config.contextual_max_tokens,
        );
        let key = CacheKey::for_interest(interest.id, time_of_day.as_str(), now);
        self.generate_or(&key, request, fallback).await
    }

    // --- Progression ---

    /// Records `score` and reports whether the caller should advance the interest's level.
    pub fn check_and_advance_level(&self, interest: &mut UserInterest, score: u8) -> bool {
        let advance = progression::check_and_advance_level(interest, score);
        if advance {
            info!(
                interest_id = %interest.id,
                level = interest.progression_level,
                "Interest is ready to advance"
            );
        }
        advance
    }

    // --- Cache ---

    /// Returns the stored text for `key`, if any.
    pub async fn cached_prompt(&self, key: &CacheKey) -> PortResult<Option<String>> {
        self.cache.get(key.as_str()).await
    }

    pub async fn clear_cache(&self) -> PortResult<()> {
        self.cache.clear().await?;
        info!("Prompt cache cleared.");
        Ok(())
    }

    //=====================================================================================
    // Helpers
    //=====================================================================================

    fn request(&self, messages: Vec<ChatMessage>, max_tokens: u32) -> GenerationRequest {
        GenerationRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens,
        }
    }

    /// Runs one generation and records the outcome, returning `fallback()` on any failure.
    async fn generate_or(
        &self,
        key: &CacheKey,
        request: GenerationRequest,
        fallback: impl FnOnce() -> &'static str,
    ) -> String {
        match self.cached_or_generate(key, request).await {
            Ok(text) => {
                self.set_error(None);
                text
            }
            Err(err) => {
                warn!(
                    cache_key = key.as_str(),
                    error = %err,
                    "Prompt generation failed, using fallback"
                );
                self.set_error(Some(PromptError::from(&err)));
                fallback().to_string()
            }
        }
    }

    async fn cached_or_generate(
        &self,
        key: &CacheKey,
        request: GenerationRequest,
    ) -> Result<String, BackendError> {
        match self.cache.get(key.as_str()).await {
            Ok(Some(hit)) => {
                debug!(cache_key = key.as_str(), "Prompt cache hit");
                return Ok(hit);
            }
            Ok(None) => debug!(cache_key = key.as_str(), "Prompt cache miss"),
            Err(e) => warn!(cache_key = key.as_str(), "Prompt cache read failed: {}", e),
        }

        let text = self.backend.generate(request).await?.first_text()?;
        info!(cache_key = key.as_str(), "Generated prompt ({} chars)", text.len());

        if let Err(e) = self.cache.put(key.as_str(), &text).await {
            warn!(cache_key = key.as_str(), "Prompt cache write failed: {}", e);
        }
        Ok(text)
    }
}

/// Keyword template for the goal, or a random prompt for `time_of_day` when nothing matches.
pub fn offline_prompt(goal: &Goal, time_of_day: TimeOfDay) -> String {
    offline_template(&goal.text)
        .unwrap_or_else(|| random_pool_prompt(time_of_day))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{InterestCategory, SessionKind};
    use crate::fallback::{diet_prompt, EVENING_POOL, MORNING_POOL};
    use crate::ports::{GenerationResponse, PortError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Notify;

    //-------------------------------------------------------------------------------------
    // Fake ports
    //-------------------------------------------------------------------------------------

    struct RecordingBackend {
        reply: Result<GenerationResponse, BackendError>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl RecordingBackend {
        fn replying(text: &str) -> Arc<Self> {
            Self::with(Ok(GenerationResponse {
                candidates: vec![text.to_string()],
            }))
        }

        fn failing(err: BackendError) -> Arc<Self> {
            Self::with(Err(err))
        }

        fn with(reply: Result<GenerationResponse, BackendError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn last_request(&self) -> GenerationRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl TextGenerationBackend for RecordingBackend {
        async fn generate(
            &self,
            request: GenerationRequest,
        ) -> Result<GenerationResponse, BackendError> {
            self.requests.lock().unwrap().push(request);
            self.reply.clone()
        }
    }

    struct StaticConnectivity(bool);

    #[async_trait]
    impl ConnectivityProbe for StaticConnectivity {
        async fn is_reachable(&self) -> bool {
            self.0
        }
    }

    #[derive(Default)]
    struct MemoryCache {
        entries: Mutex<HashMap<String, String>>,
        broken: bool,
    }

    #[async_trait]
    impl KeyValueCache for MemoryCache {
        async fn get(&self, key: &str) -> PortResult<Option<String>> {
            if self.broken {
                return Err(PortError::Unexpected("cache offline".to_string()));
            }
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn put(&self, key: &str, value: &str) -> PortResult<()> {
            if self.broken {
                return Err(PortError::Unexpected("cache offline".to_string()));
            }
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn clear(&self) -> PortResult<()> {
            self.entries.lock().unwrap().clear();
            Ok(())
        }
    }

    fn engine(backend: Arc<RecordingBackend>, online: bool) -> PromptEngine {
        PromptEngine::new(
            backend,
            Arc::new(MemoryCache::default()),
            Arc::new(StaticConnectivity(online)),
            EngineConfig::default(),
        )
    }

    fn goal_with_vision(vision: &str) -> Goal {
        let mut goal = Goal::new("Move to Lisbon");
        goal.vision = Some(vision.to_string());
        goal
    }

    //-------------------------------------------------------------------------------------
    // Visualization
    //-------------------------------------------------------------------------------------

    #[tokio::test]
    async fn offline_visualization_uses_pool_without_backend() {
        let backend = RecordingBackend::replying("never used");
        let engine = engine(backend.clone(), false);
        let goal = goal_with_vision("A sunny flat near the river");

        let morning = engine
            .generate_visualization_prompt(&goal, TimeOfDay::Morning)
            .await;
        let evening = engine
            .generate_visualization_prompt(&goal, TimeOfDay::Evening)
            .await;

        assert!(MORNING_POOL.contains(&morning.as_str()));
        assert!(EVENING_POOL.contains(&evening.as_str()));
        assert_eq!(backend.calls(), 0);
        assert_eq!(engine.last_error(), None);
        assert!(!engine.is_busy());
    }

    #[tokio::test]
    async fn empty_vision_never_calls_backend() {
        let backend = RecordingBackend::replying("never used");
        let engine = engine(backend.clone(), true);
        let mut goal = Goal::new("Run a marathon");

        let prompt = engine
            .generate_visualization_prompt(&goal, TimeOfDay::Evening)
            .await;
        assert!(EVENING_POOL.contains(&prompt.as_str()));

        goal.vision = Some("  ".to_string());
        engine
            .generate_visualization_prompt(&goal, TimeOfDay::Morning)
            .await;
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn successful_visualization_is_trimmed_and_cached() {
        let backend = RecordingBackend::replying("  Picture the balcony at dawn.  \n");
        let engine = engine(backend.clone(), true);
        let goal = goal_with_vision("A balcony over the Tagus");
        let at = Utc::now();

        let prompt = engine
            .visualization_prompt_at(&goal, TimeOfDay::Morning, at)
            .await;
        assert_eq!(prompt, "Picture the balcony at dawn.");

        let key = CacheKey::for_goal(goal.id, at);
        assert_eq!(
            engine.cached_prompt(&key).await.unwrap().as_deref(),
            Some("Picture the balcony at dawn.")
        );

        let request = backend.last_request();
        let user = &request.messages[1].content;
        assert!(user.contains("Move to Lisbon"));
        assert!(user.contains("the future"));
        assert!(user.contains("morning"));
        assert_eq!(request.max_tokens, EngineConfig::default().visualization_max_tokens);
    }

    #[tokio::test]
    async fn same_cache_key_returns_same_text_without_second_call() {
        let backend = RecordingBackend::replying("Feel the keys in your hand.");
        let engine = engine(backend.clone(), true);
        let goal = goal_with_vision("Keys to my own place");
        let at = Utc::now();

        let first = engine
            .visualization_prompt_at(&goal, TimeOfDay::Evening, at)
            .await;
        let second = engine
            .visualization_prompt_at(&goal, TimeOfDay::Evening, at)
            .await;

        assert_eq!(first, second);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn clearing_cache_forces_regeneration() {
        let backend = RecordingBackend::replying("Fresh prompt");
        let engine = engine(backend.clone(), true);
        let goal = goal_with_vision("Garden full of tomatoes");
        let at = Utc::now();

        engine.visualization_prompt_at(&goal, TimeOfDay::Morning, at).await;
        engine.clear_cache().await.unwrap();
        assert_eq!(
            engine.cached_prompt(&CacheKey::for_goal(goal.id, at)).await.unwrap(),
            None
        );
        engine.visualization_prompt_at(&goal, TimeOfDay::Morning, at).await;
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn vision_is_cut_to_last_thousand_chars() {
        let backend = RecordingBackend::replying("ok");
        let engine = engine(backend.clone(), true);
        let vision = format!("{}{}", "a".repeat(500), "b".repeat(1000));
        let mut goal = goal_with_vision(&vision);
        goal.target_date = chrono::NaiveDate::from_ymd_opt(2030, 6, 1);

        engine
            .generate_visualization_prompt(&goal, TimeOfDay::Evening)
            .await;
        let user = backend.last_request().messages[1].content.clone();
        assert!(user.contains(&"b".repeat(1000)));
        assert!(!user.contains("ab"));
        assert!(user.contains("June 1, 2030"));
    }

    #[tokio::test]
    async fn failures_set_user_visible_error_and_fall_back() {
        let cases = [
            (BackendError::Unreachable, PromptError::NoConnectivity),
            (BackendError::EmptyResponse, PromptError::EmptyResponse),
            (
                BackendError::Status {
                    status: Some(500),
                    body: "boom".to_string(),
                },
                PromptError::ServiceError,
            ),
            (BackendError::Decode("bad json".to_string()), PromptError::ServiceError),
            (BackendError::Transport("reset".to_string()), PromptError::ServiceError),
        ];
        for (err, expected) in cases {
            let engine = engine(RecordingBackend::failing(err), true);
            let goal = goal_with_vision("A calm morning routine");
            let prompt = engine
                .generate_visualization_prompt(&goal, TimeOfDay::Morning)
                .await;
            assert!(MORNING_POOL.contains(&prompt.as_str()));
            assert_eq!(engine.last_error(), Some(expected));
            assert!(!engine.is_busy());
        }
    }

    #[tokio::test]
    async fn blank_response_counts_as_empty() {
        let engine = engine(RecordingBackend::replying("   "), true);
        let goal = goal_with_vision("Quiet cabin");
        let prompt = engine
            .generate_visualization_prompt(&goal, TimeOfDay::Evening)
            .await;
        assert!(EVENING_POOL.contains(&prompt.as_str()));
        assert_eq!(engine.last_error(), Some(PromptError::EmptyResponse));
    }

    #[tokio::test]
    async fn success_clears_previous_error() {
        let failing = engine(RecordingBackend::failing(BackendError::EmptyResponse), true);
        failing.set_error(Some(PromptError::ServiceError));
        let goal = goal_with_vision("Sunrise runs");
        failing
            .generate_visualization_prompt(&goal, TimeOfDay::Morning)
            .await;
        assert_eq!(failing.last_error(), Some(PromptError::EmptyResponse));

        let ok = engine(RecordingBackend::replying("Go"), true);
        ok.set_error(Some(PromptError::ServiceError));
        ok.generate_visualization_prompt(&goal, TimeOfDay::Morning).await;
        assert_eq!(ok.last_error(), None);
    }

    #[tokio::test]
    async fn broken_cache_does_not_block_generation() {
        let backend = RecordingBackend::replying("Still works");
        let engine = PromptEngine::new(
            backend.clone(),
            Arc::new(MemoryCache {
                broken: true,
                ..Default::default()
            }),
            Arc::new(StaticConnectivity(true)),
            EngineConfig::default(),
        );
        let prompt = engine
            .generate_visualization_prompt(&goal_with_vision("Anything"), TimeOfDay::Morning)
            .await;
        assert_eq!(prompt, "Still works");
    }

    struct GatedBackend {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl TextGenerationBackend for GatedBackend {
        async fn generate(
            &self,
            _request: GenerationRequest,
        ) -> Result<GenerationResponse, BackendError> {
            self.started.notify_one();
            self.release.notified().await;
            Ok(GenerationResponse {
                candidates: vec!["done".to_string()],
            })
        }
    }

    #[tokio::test]
    async fn busy_flag_is_raised_while_generating() {
        let backend = Arc::new(GatedBackend {
            started: Notify::new(),
            release: Notify::new(),
        });
        let engine = Arc::new(PromptEngine::new(
            backend.clone(),
            Arc::new(MemoryCache::default()),
            Arc::new(StaticConnectivity(true)),
            EngineConfig::default(),
        ));

        let task = {
            let engine = engine.clone();
            tokio::spawn(async move {
                let goal = goal_with_vision("Studio by the sea");
                engine
                    .generate_visualization_prompt(&goal, TimeOfDay::Morning)
                    .await
            })
        };

        backend.started.notified().await;
        assert!(engine.is_busy());
        backend.release.notify_one();

        assert_eq!(task.await.unwrap(), "done");
        assert!(!engine.status().is_busy);
    }

    //-------------------------------------------------------------------------------------
    // Offline, baseline and contextual prompts
    //-------------------------------------------------------------------------------------

    #[test]
    fn offline_prompt_uses_keywords_then_pool() {
        let matched = offline_prompt(&Goal::new("Find a new JOB in design"), TimeOfDay::Morning);
        assert!(matched.contains("career"));

        let unmatched = offline_prompt(&Goal::new("Learn the cello"), TimeOfDay::Evening);
        assert!(EVENING_POOL.contains(&unmatched.as_str()));

        let engine = engine(RecordingBackend::replying("unused"), true);
        assert!(!engine
            .generate_offline_prompt(&Goal::new("Learn the cello"))
            .is_empty());
    }

    #[tokio::test]
    async fn baseline_prompt_is_seeded_with_interest_description() {
        let backend =
            RecordingBackend::replying("What does a good week of meals look like to you?");
        let engine = engine(backend.clone(), true);
        let mut interest = UserInterest::new(InterestCategory::Diet);
        interest.subcategory = Some("Meal prep".to_string());
        interest.description = Some("Cook at home more often".to_string());

        let prompt = engine.generate_baseline_prompt(&interest).await;
        assert_eq!(prompt, "What does a good week of meals look like to you?");

        let request = backend.last_request();
        assert!(request.messages[1]
            .content
            .contains("Health & Diet - Meal prep: Cook at home more often"));
        assert_eq!(request.max_tokens, 200);
    }

    #[tokio::test]
    async fn contextual_ceiling_stays_below_baseline() {
        let backend = RecordingBackend::replying("How did lunch go?");
        let engine = PromptEngine::new(
            backend.clone(),
            Arc::new(MemoryCache::default()),
            Arc::new(StaticConnectivity(true)),
            EngineConfig {
                contextual_max_tokens: 400,
                ..EngineConfig::default()
            },
        );
        let interest = UserInterest::new(InterestCategory::Diet);

        engine.generate_baseline_prompt(&interest).await;
        let baseline = backend.last_request().max_tokens;
        engine
            .generate_contextual_prompt(&interest, None, &[], false)
            .await;
        let contextual = backend.last_request().max_tokens;

        assert_eq!(baseline, 200);
        assert_eq!(contextual, 199);
        assert_eq!(engine.config().contextual_max_tokens, 199);
    }

    #[tokio::test]
    async fn baseline_failure_uses_category_question() {
        let engine = engine(RecordingBackend::failing(BackendError::Transport("x".into())), true);
        let career = UserInterest::new(InterestCategory::Career);
        assert_eq!(
            engine.generate_baseline_prompt(&career).await,
            category_prompts(InterestCategory::Career).baseline_questions[0]
        );

        let custom = UserInterest::new(InterestCategory::Custom);
        assert_eq!(
            engine.generate_baseline_prompt(&custom).await,
            crate::fallback::GENERIC_BASELINE_QUESTION
        );
    }

    #[tokio::test]
    async fn contextual_prompt_sends_all_summaries() {
        let backend =
            RecordingBackend::replying("Yesterday you mentioned sugar cravings. What helped?");
        let engine = engine(backend.clone(), true);
        let mut interest = UserInterest::new(InterestCategory::Diet);
        interest.baseline_responses = vec!["I snack late at night.".to_string()];
        let mut session = JournalSession::new(
            SessionKind::DailyReview,
            "How did today go?",
            Utc::now() - chrono::Duration::days(1),
        )
        .for_interest(interest.id);
        session.complete("Sugar cravings after lunch again", Some(6));
        let sessions = vec![session];

        let prompt = engine
            .generate_contextual_prompt(&interest, sessions.last(), &sessions, true)
            .await;
        assert!(prompt.starts_with("Yesterday"));

        let request = backend.last_request();
        let user = &request.messages[1].content;
        assert!(user.contains("FOCUS AREA"));
        assert!(user.contains("I snack late at night."));
        assert!(user.contains("yesterday"));
        assert!(user.contains("Current progression level: 1/10"));
        assert!(user.contains("LEARNING INSIGHTS"));
        assert!(user.contains("evening"));
        assert!(request.max_tokens < engine.config().baseline_max_tokens);
    }

    #[tokio::test]
    async fn contextual_failure_uses_level_indexed_diet_prompt() {
        let engine = engine(RecordingBackend::failing(BackendError::EmptyResponse), true);
        let mut interest = UserInterest::new(InterestCategory::Diet);
        interest.progression_level = 3;

        let prompt = engine
            .generate_contextual_prompt(&interest, None, &[], false)
            .await;
        assert_eq!(
            prompt,
            "What specific nutrients or food groups do you want to focus on today?"
        );

        interest.progression_level = 10;
        let prompt = engine
            .generate_contextual_prompt(&interest, None, &[], true)
            .await;
        assert_eq!(prompt, diet_prompt(10, TimeOfDay::Evening));
        assert!(prompt.contains("optimize tomorrow"));
    }

    #[tokio::test]
    async fn offline_contextual_prompt_skips_backend() {
        let backend = RecordingBackend::replying("unused");
        let engine = engine(backend.clone(), false);
        let interest = UserInterest::new(InterestCategory::Fitness);
        let prompt = engine
            .generate_contextual_prompt(&interest, None, &[], false)
            .await;
        assert_eq!(
            prompt,
            category_prompts(InterestCategory::Fitness)
                .contextual_fallback(1, TimeOfDay::Morning)
        );
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn engine_advancement_leaves_level_to_caller() {
        let engine = engine(RecordingBackend::replying("unused"), true);
        let mut interest = UserInterest::new(InterestCategory::Career);
        let results: Vec<bool> = [8, 8, 7, 9, 8]
            .into_iter()
            .map(|s| engine.check_and_advance_level(&mut interest, s))
            .collect();
        assert_eq!(results, vec![false, false, false, false, true]);
        assert_eq!(interest.progression_level, 1);
    }
}
