//! Run state for one "Generate Blog Post" action.
//!
//! `Shell` owns the form inputs and whatever the current run has produced.
//! It never performs I/O: [`Shell::trigger`] hands back the query to fetch,
//! [`Shell::on_fetched`] hands back the generation request, and the caller
//! runs [`fetch_stage`] and [`generate_stage`] in that order.

use redscribe_core::{
    ContentFetcher, CoreError, ErrorCategory, ErrorExt, ErrorReporter, FetchedContent,
    GeneratedPost, GenerationRequest, PostSynthesizer, SearchQuery, UiSettings,
};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub const VALIDATION_MESSAGE: &str = "Please fill in all fields.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Generate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetch => f.write_str("Fetching Reddit posts"),
            Stage::Generate => f.write_str("Generating the blog post"),
        }
    }
}

/// A failed stage, reduced to what the UI needs to show.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} failed: {message}")]
pub struct RunFailure {
    pub stage: Stage,
    pub category: ErrorCategory,
    pub message: String,
}

impl RunFailure {
    pub fn from_error(stage: Stage, error: &CoreError) -> Self {
        ErrorReporter::new().report_error(error);
        Self {
            stage,
            category: error.category(),
            message: error.user_friendly_message(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Idle,
    Fetching { limit: u32 },
    Generating,
    Finished,
    Failed,
}

struct ActiveRun {
    api_key: String,
    keyword: String,
}

pub struct Shell {
    pub api_key: String,
    pub keyword: String,
    pub channel: String,
    limit: u32,
    max_limit: u32,
    status: RunStatus,
    active: Option<ActiveRun>,
    validation_error: Option<String>,
    combined_text: Option<String>,
    generated_post: Option<GeneratedPost>,
    failure: Option<RunFailure>,
}

impl Shell {
    pub fn new(ui: &UiSettings) -> Self {
        Self {
            api_key: String::new(),
            keyword: String::new(),
            channel: String::new(),
            limit: ui.default_fetch_limit.clamp(1, ui.max_fetch_limit.max(1)),
            max_limit: ui.max_fetch_limit.max(1),
            status: RunStatus::Idle,
            active: None,
            validation_error: None,
            combined_text: None,
            generated_post: None,
            failure: None,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn max_limit(&self) -> u32 {
        self.max_limit
    }

    pub fn set_limit(&mut self, limit: u32) {
        self.limit = limit.clamp(1, self.max_limit);
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self.status,
            RunStatus::Fetching { .. } | RunStatus::Generating
        )
    }

    pub fn validation_error(&self) -> Option<&str> {
        self.validation_error.as_deref()
    }

    pub fn combined_text(&self) -> Option<&str> {
        self.combined_text.as_deref()
    }

    pub fn generated_post(&self) -> Option<&GeneratedPost> {
        self.generated_post.as_ref()
    }

    pub fn failure(&self) -> Option<&RunFailure> {
        self.failure.as_ref()
    }

    /// Spinner text for the stage in progress.
    pub fn status_line(&self) -> Option<String> {
        match self.status {
            RunStatus::Fetching { limit } => Some(format!("Fetching {} Reddit posts...", limit)),
            RunStatus::Generating => Some("Generating blog post...".to_string()),
            _ => None,
        }
    }

    /// Starts a run, or records a validation message and returns `None`.
    pub fn trigger(&mut self) -> Option<SearchQuery> {
        if self.is_busy() {
            warn!("Ignoring trigger while a run is in progress");
            return None;
        }

        self.validation_error = None;
        if self.api_key.trim().is_empty() || self.keyword.trim().is_empty() {
            self.validation_error = Some(VALIDATION_MESSAGE.to_string());
            return None;
        }

        let query = match SearchQuery::new(
            self.keyword.as_str(),
            self.channel.as_str(),
            self.limit,
            self.max_limit,
        ) {
            Ok(query) => query,
            Err(e) => {
                self.validation_error = Some(e.user_friendly_message());
                return None;
            }
        };

        self.combined_text = None;
        self.generated_post = None;
        self.failure = None;
        self.active = Some(ActiveRun {
            api_key: self.api_key.trim().to_string(),
            keyword: query.keyword.clone(),
        });
        self.status = RunStatus::Fetching { limit: query.limit };

        info!(
            "Starting run for '{}' in '{}' (limit {})",
            query.keyword, query.channel, query.limit
        );
        Some(query)
    }

    /// Records the fetch outcome; returns the generation request only on success.
    pub fn on_fetched(
        &mut self,
        result: Result<FetchedContent, RunFailure>,
    ) -> Option<GenerationRequest> {
        if !matches!(self.status, RunStatus::Fetching { .. }) {
            return None;
        }

        match result {
            Ok(content) => {
                let active = self.active.as_ref()?;
                let request = GenerationRequest::new(
                    active.api_key.as_str(),
                    active.keyword.as_str(),
                    &content,
                );
                self.combined_text = Some(content.combined_text);
                self.status = RunStatus::Generating;
                Some(request)
            }
            Err(failure) => {
                self.fail(failure);
                None
            }
        }
    }

    pub fn on_generated(&mut self, result: Result<GeneratedPost, RunFailure>) {
        if self.status != RunStatus::Generating {
            return;
        }

        match result {
            Ok(post) => {
                self.generated_post = Some(post);
                self.status = RunStatus::Finished;
                self.active = None;
            }
            Err(failure) => self.fail(failure),
        }
    }

    fn fail(&mut self, failure: RunFailure) {
        warn!("{}", failure);
        self.failure = Some(failure);
        self.status = RunStatus::Failed;
        self.active = None;
    }
}

pub async fn fetch_stage(
    fetcher: Arc<dyn ContentFetcher>,
    query: SearchQuery,
) -> Result<FetchedContent, RunFailure> {
    fetcher
        .fetch(&query)
        .await
        .map_err(|e| RunFailure::from_error(Stage::Fetch, &e))
}

pub async fn generate_stage(
    synthesizer: Arc<dyn PostSynthesizer>,
    request: GenerationRequest,
) -> Result<GeneratedPost, RunFailure> {
    synthesizer
        .synthesize(request)
        .await
        .map_err(|e| RunFailure::from_error(Stage::Generate, &e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use redscribe_core::{Document, LlmError, RedditApiError, Reference};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeFetcher {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ContentFetcher for FakeFetcher {
        async fn fetch(&self, query: &SearchQuery) -> Result<FetchedContent, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RedditApiError::AuthenticationFailed {
                    reason: "invalid_client".to_string(),
                }
                .into());
            }

            let mut content = FetchedContent::default();
            for (suffix, permalink) in [("A", "/r/Baking/a"), ("B", "/r/Baking/b")]
                .into_iter()
                .take(query.limit as usize)
            {
                content.push(
                    &Document {
                        title: format!("Tip {}", suffix),
                        body: format!("text {}", suffix),
                    },
                    Reference {
                        title: format!("Tip {}", suffix),
                        url: format!("https://www.reddit.com{}", permalink),
                    },
                );
            }
            Ok(content)
        }
    }

    struct FakeSynthesizer {
        fail: bool,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    #[async_trait]
    impl PostSynthesizer for FakeSynthesizer {
        async fn synthesize(&self, request: GenerationRequest) -> Result<GeneratedPost, CoreError> {
            self.requests.lock().unwrap().push(request);
            if self.fail {
                return Err(LlmError::ServiceUnavailable {
                    provider: "OpenAI".to_string(),
                }
                .into());
            }
            Ok(GeneratedPost::new("# Sourdough\n\nBody"))
        }
    }

    struct Harness {
        fetcher: Arc<FakeFetcher>,
        synthesizer: Arc<FakeSynthesizer>,
    }

    impl Harness {
        fn new(fetch_fails: bool, generate_fails: bool) -> Self {
            Self {
                fetcher: Arc::new(FakeFetcher {
                    fail: fetch_fails,
                    calls: AtomicUsize::new(0),
                }),
                synthesizer: Arc::new(FakeSynthesizer {
                    fail: generate_fails,
                    requests: Mutex::new(Vec::new()),
                }),
            }
        }

        /// Drives the shell through a run the same way the GUI chains its commands.
        async fn run(&self, shell: &mut Shell) {
            let Some(query) = shell.trigger() else {
                return;
            };
            let fetched = fetch_stage(self.fetcher.clone(), query).await;
            if let Some(request) = shell.on_fetched(fetched) {
                let generated = generate_stage(self.synthesizer.clone(), request).await;
                shell.on_generated(generated);
            }
        }

        fn fetch_calls(&self) -> usize {
            self.fetcher.calls.load(Ordering::SeqCst)
        }

        fn synth_calls(&self) -> usize {
            self.synthesizer.requests.lock().unwrap().len()
        }
    }

    fn filled_shell() -> Shell {
        let mut shell = Shell::new(&UiSettings::default());
        shell.api_key = "sk-test".to_string();
        shell.keyword = "sourdough".to_string();
        shell.channel = "Baking".to_string();
        shell.set_limit(2);
        shell
    }

    #[tokio::test]
    async fn test_empty_keyword_makes_no_calls() {
        let harness = Harness::new(false, false);
        let mut shell = filled_shell();
        shell.keyword = "  ".to_string();

        harness.run(&mut shell).await;

        assert_eq!(harness.fetch_calls(), 0);
        assert_eq!(harness.synth_calls(), 0);
        assert_eq!(shell.validation_error(), Some(VALIDATION_MESSAGE));
        assert_eq!(shell.status(), RunStatus::Idle);
        assert!(shell.failure().is_none());
    }

    #[tokio::test]
    async fn test_empty_api_key_makes_no_calls() {
        let harness = Harness::new(false, false);
        let mut shell = filled_shell();
        shell.api_key.clear();

        harness.run(&mut shell).await;

        assert_eq!(harness.fetch_calls(), 0);
        assert_eq!(harness.synth_calls(), 0);
        assert_eq!(shell.validation_error(), Some(VALIDATION_MESSAGE));
    }

    #[tokio::test]
    async fn test_fetch_failure_skips_synthesis() {
        let harness = Harness::new(true, false);
        let mut shell = filled_shell();

        harness.run(&mut shell).await;

        assert_eq!(harness.fetch_calls(), 1);
        assert_eq!(harness.synth_calls(), 0);
        assert_eq!(shell.status(), RunStatus::Failed);
        assert!(shell.combined_text().is_none());

        let failure = shell.failure().unwrap();
        assert_eq!(failure.stage, Stage::Fetch);
        assert_eq!(failure.category, ErrorCategory::Authentication);
        assert!(failure.to_string().starts_with("Fetching Reddit posts failed"));
    }

    #[tokio::test]
    async fn test_successful_run() {
        let harness = Harness::new(false, false);
        let mut shell = filled_shell();

        harness.run(&mut shell).await;

        assert_eq!(shell.status(), RunStatus::Finished);
        assert_eq!(
            shell.combined_text(),
            Some("Title: Tip A\nText: text A\n\nTitle: Tip B\nText: text B\n\n")
        );
        assert_eq!(shell.generated_post().unwrap().as_str(), "# Sourdough\n\nBody");

        let requests = harness.synthesizer.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].api_key, "sk-test");
        assert_eq!(requests[0].keyword, "sourdough");
        assert_eq!(
            requests[0].formatted_references,
            "1. [Tip A](https://www.reddit.com/r/Baking/a)\n2. [Tip B](https://www.reddit.com/r/Baking/b)"
        );
    }

    #[tokio::test]
    async fn test_generation_failure_keeps_fetched_text() {
        let harness = Harness::new(false, true);
        let mut shell = filled_shell();

        harness.run(&mut shell).await;

        assert_eq!(shell.status(), RunStatus::Failed);
        assert!(shell.combined_text().unwrap().starts_with("Title: Tip A"));
        assert!(shell.generated_post().is_none());

        let failure = shell.failure().unwrap();
        assert_eq!(failure.stage, Stage::Generate);
        assert_eq!(failure.category, ErrorCategory::Provider);
    }

    #[tokio::test]
    async fn test_new_run_clears_previous_outputs() {
        let harness = Harness::new(false, false);
        let mut shell = filled_shell();
        harness.run(&mut shell).await;
        assert!(shell.generated_post().is_some());

        shell.keyword.clear();
        harness.run(&mut shell).await;
        assert_eq!(shell.validation_error(), Some(VALIDATION_MESSAGE));

        shell.keyword = "rye".to_string();
        let query = shell.trigger().unwrap();
        assert_eq!(query.keyword, "rye");
        assert!(shell.validation_error().is_none());
        assert!(shell.generated_post().is_none());
        assert!(shell.combined_text().is_none());
        assert_eq!(shell.status_line().as_deref(), Some("Fetching 2 Reddit posts..."));
    }

    #[test]
    fn test_trigger_ignored_while_busy() {
        let mut shell = filled_shell();
        assert!(shell.trigger().is_some());
        assert!(shell.is_busy());
        assert!(shell.trigger().is_none());
        assert!(shell.validation_error().is_none());
    }

    #[test]
    fn test_stale_results_are_ignored() {
        let mut shell = filled_shell();
        assert!(shell.on_fetched(Ok(FetchedContent::default())).is_none());
        shell.on_generated(Ok(GeneratedPost::new("late")));
        assert!(shell.generated_post().is_none());
        assert_eq!(shell.status(), RunStatus::Idle);
    }

    #[test]
    fn test_limit_is_clamped() {
        let mut shell = Shell::new(&UiSettings::default());
        assert_eq!(shell.limit(), 10);
        shell.set_limit(0);
        assert_eq!(shell.limit(), 1);
        shell.set_limit(500);
        assert_eq!(shell.limit(), 50);
    }

    #[test]
    fn test_zero_max_limit_does_not_panic() {
        let shell = Shell::new(&UiSettings {
            max_fetch_limit: 0,
            default_fetch_limit: 10,
        });
        assert_eq!(shell.max_limit(), 1);
        assert_eq!(shell.limit(), 1);
    }

    #[test]
    fn test_run_failure_reports_config_errors_as_validation() {
        let error = CoreError::Config(redscribe_core::ConfigError::InvalidValue {
            field: "reddit.api_base".to_string(),
            value: "not a url".to_string(),
        });
        let failure = RunFailure::from_error(Stage::Fetch, &error);

        assert_eq!(failure.category, ErrorCategory::Validation);
        assert_eq!(failure.message, error.user_friendly_message());
        assert!(failure.message.contains("reddit.api_base"));
    }
}
