//! Bounded multi-turn extraction for a single chunk

use crate::error::{ExtractorError, Stage};
use crate::prompt::ExtractionPrompts;
use graphgen_domain::traits::LlmClient;
use graphgen_domain::ConversationHistory;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Raw output of one chunk's glean loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GleanOutput {
    /// Concatenation of the initial response and every glean response
    pub raw: String,
    /// LLM calls issued, decision queries included
    pub calls: usize,
    /// Glean rounds that produced an extraction
    pub rounds: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GleanState {
    Initial,
    Deciding,
    Extracting,
    Done,
}

/// Whether a "should continue" answer means yes
///
/// Surrounding whitespace, then double quotes, then single quotes are
/// stripped before a case-insensitive comparison with `yes`.
///
/// # Examples
///
/// ```
/// use graphgen_extractor::is_affirmative;
///
/// assert!(is_affirmative(" \"YES\"\n"));
/// assert!(!is_affirmative("yes, a few more"));
/// ```
pub fn is_affirmative(answer: &str) -> bool {
    answer
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .eq_ignore_ascii_case("yes")
}

/// Why a bounded call produced no answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CallFailure {
    /// The provider returned an error
    Failed(String),
    /// The deadline passed first
    TimedOut,
}

/// Issue one LLM call bounded by `limit`
///
/// Callers attach their own context (chunk and stage, or merge key).
pub(crate) async fn bounded_call<L: LlmClient>(
    llm: &L,
    prompt: &str,
    history: &ConversationHistory,
    limit: Duration,
) -> Result<String, CallFailure> {
    match timeout(limit, llm.generate(prompt, history)).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(e)) => Err(CallFailure::Failed(e.to_string())),
        Err(_) => Err(CallFailure::TimedOut),
    }
}

/// Drives the initial extraction and up to `max_loop` glean rounds
pub struct GleanLoop<'a, L> {
    llm: &'a L,
    chunk_id: &'a str,
    prompts: &'a ExtractionPrompts,
    max_loop: usize,
    call_timeout: Duration,
}

impl<'a, L: LlmClient> GleanLoop<'a, L> {
    /// Create a loop for one chunk
    pub fn new(
        llm: &'a L,
        chunk_id: &'a str,
        prompts: &'a ExtractionPrompts,
        max_loop: usize,
        call_timeout: Duration,
    ) -> Self {
        Self {
            llm,
            chunk_id,
            prompts,
            max_loop,
            call_timeout,
        }
    }

    /// Run the loop to completion
    ///
    /// Calls are strictly sequential. Only (continue, glean) exchanges are
    /// added to the history; decision answers never are. Any failed call
    /// aborts the chunk.
    pub async fn run(&self) -> Result<GleanOutput, ExtractorError> {
        let mut state = GleanState::Initial;
        let mut history = ConversationHistory::new();
        let mut raw = String::new();
        let mut calls = 0;
        let mut rounds = 0;

        loop {
            state = match state {
                GleanState::Initial => {
                    let response = self
                        .call(&self.prompts.hint, &history, Stage::Initial)
                        .await?;
                    calls += 1;
                    debug!(
                        "Chunk '{}' initial extraction returned {} chars",
                        self.chunk_id,
                        response.len()
                    );
                    history.push(self.prompts.hint.as_str(), response.as_str());
                    raw = response;
                    GleanState::Deciding
                }
                GleanState::Deciding => {
                    if rounds >= self.max_loop {
                        GleanState::Done
                    } else {
                        let stage = Stage::Deciding { round: rounds + 1 };
                        let answer = self.call(self.prompts.if_loop, &history, stage).await?;
                        calls += 1;
                        if is_affirmative(&answer) {
                            GleanState::Extracting
                        } else {
                            GleanState::Done
                        }
                    }
                }
                GleanState::Extracting => {
                    let stage = Stage::Extracting { round: rounds + 1 };
                    let glean = self
                        .call(self.prompts.continue_extraction, &history, stage)
                        .await?;
                    calls += 1;
                    rounds += 1;
                    debug!(
                        "Chunk '{}' glean round {} returned {} chars",
                        self.chunk_id,
                        rounds,
                        glean.len()
                    );
                    history.push(self.prompts.continue_extraction, glean.as_str());
                    raw.push_str(&glean);
                    GleanState::Deciding
                }
                GleanState::Done => break,
            };
        }

        Ok(GleanOutput { raw, calls, rounds })
    }

    async fn call(
        &self,
        prompt: &str,
        history: &ConversationHistory,
        stage: Stage,
    ) -> Result<String, ExtractorError> {
        let chunk_id = self.chunk_id.to_string();
        bounded_call(self.llm, prompt, history, self.call_timeout)
            .await
            .map_err(|failure| match failure {
                CallFailure::Failed(message) => ExtractorError::Llm {
                    chunk_id,
                    stage,
                    message,
                },
                CallFailure::TimedOut => ExtractorError::Timeout { chunk_id, stage },
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::PromptComposer;
    use graphgen_llm::{MockProvider, RetryPolicy, RetryingProvider};
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn prompts() -> ExtractionPrompts {
        PromptComposer::default().compose("Entity1 was founded by Person1.")
    }

    #[test]
    fn test_affirmative_normalisation() {
        assert!(is_affirmative("yes"));
        assert!(is_affirmative("  Yes  "));
        assert!(is_affirmative("'yes'"));
        assert!(is_affirmative("\"'YES'\""));
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative("yes."));
        assert!(!is_affirmative("y"));
        assert!(!is_affirmative(""));
    }

    #[tokio::test]
    async fn test_zero_max_loop_makes_one_call() {
        let llm = MockProvider::new("(\"entity\"<|>A<|>ORG<|>a)");
        let prompts = prompts();
        let output = GleanLoop::new(&llm, "c1", &prompts, 0, TIMEOUT).run().await.unwrap();

        assert_eq!(output.calls, 1);
        assert_eq!(output.rounds, 0);
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_first_no_stops_after_decision() {
        let llm = MockProvider::scripted(["R0", "no"]);
        let prompts = prompts();
        let output = GleanLoop::new(&llm, "c1", &prompts, 3, TIMEOUT).run().await.unwrap();

        assert_eq!(output.raw, "R0");
        assert_eq!(output.calls, 2);
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_gleans_are_concatenated_and_history_grows() {
        let llm = MockProvider::scripted(["R0", "yes", "G1", "\"YES\"", "G2", "no"]);
        let prompts = prompts();
        let output = GleanLoop::new(&llm, "c1", &prompts, 3, TIMEOUT).run().await.unwrap();

        assert_eq!(output.raw, "R0G1G2");
        assert_eq!(output.rounds, 2);
        assert_eq!(output.calls, 6);

        let history_lens: Vec<usize> = llm.calls().iter().map(|c| c.history_len).collect();
        // Decision turns are never appended
        assert_eq!(history_lens, vec![0, 1, 1, 2, 2, 3]);
    }

    #[tokio::test]
    async fn test_loop_bound_is_normal_termination() {
        let llm = MockProvider::scripted(["R0", "yes", "G1", "yes", "G2"]);
        let prompts = prompts();
        let output = GleanLoop::new(&llm, "c1", &prompts, 2, TIMEOUT).run().await.unwrap();

        assert_eq!(output.raw, "R0G1G2");
        assert_eq!(output.calls, 5);
    }

    #[tokio::test]
    async fn test_failed_glean_names_round() {
        let prompts = prompts();
        let mut llm = MockProvider::new("yes");
        llm.add_response(prompts.hint.clone(), "R0");
        llm.add_error(prompts.continue_extraction);

        let err = GleanLoop::new(&llm, "c7", &prompts, 3, TIMEOUT)
            .run()
            .await
            .unwrap_err();

        assert_eq!(err.chunk_id(), Some("c7"));
        assert_eq!(err.stage(), Some(Stage::Extracting { round: 1 }));
    }

    struct Stalled;

    #[async_trait::async_trait]
    impl LlmClient for Stalled {
        type Error = String;

        async fn generate(
            &self,
            _prompt: &str,
            _history: &ConversationHistory,
        ) -> Result<String, Self::Error> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(String::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_call_times_out() {
        let prompts = prompts();
        let err = GleanLoop::new(&Stalled, "c1", &prompts, 3, Duration::from_secs(1))
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractorError::Timeout { stage: Stage::Initial, .. }));
    }

    /// Hangs on its first call, then answers from a script
    struct HangsOnce {
        calls: AtomicUsize,
        then: MockProvider,
    }

    #[async_trait::async_trait]
    impl LlmClient for HangsOnce {
        type Error = graphgen_llm::LlmError;

        async fn generate(
            &self,
            prompt: &str,
            history: &ConversationHistory,
        ) -> Result<String, Self::Error> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_secs(3_600)).await;
            }
            self.then.generate(prompt, history).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_first_attempt_is_retried_within_call_deadline() {
        let policy = RetryPolicy {
            max_retries: 2,
            initial_backoff_ms: 100,
            max_backoff_ms: 1_000,
        };
        let attempt_timeout = Duration::from_secs(2);
        let hangs = HangsOnce {
            calls: Default::default(),
            then: MockProvider::scripted(["(\"entity\"<|>A<|>ORG<|>a)", "no"]),
        };
        let llm = RetryingProvider::new(hangs, policy)
            .with_attempt_timeout(attempt_timeout);
        let prompts = prompts();

        let deadline = policy.call_budget(attempt_timeout);
        let output = GleanLoop::new(&llm, "c1", &prompts, 3, deadline)
            .run()
            .await
            .unwrap();

        assert_eq!(output.raw, "(\"entity\"<|>A<|>ORG<|>a)");
        assert_eq!(output.calls, 2);
        // One abandoned attempt, then the initial answer and the decision
        assert_eq!(llm.inner().then.call_count(), 2);
        assert_eq!(llm.inner().calls.load(Ordering::SeqCst), 3);
    }

    proptest! {
        #[test]
        fn prop_call_count_is_bounded(
            max_loop in 0usize..5,
            answers in prop::collection::vec(prop::bool::ANY, 0..8),
        ) {
            let mut script = vec!["R0".to_string()];
            for yes in &answers {
                script.push(if *yes { "yes".to_string() } else { "no".to_string() });
                script.push("G".to_string());
            }
            let llm = MockProvider::scripted(script);
            let prompts = prompts();

            let output = tokio_test::block_on(
                GleanLoop::new(&llm, "c1", &prompts, max_loop, TIMEOUT).run(),
            )
            .unwrap();

            prop_assert!(output.calls <= 1 + 2 * max_loop);
            prop_assert_eq!(output.calls, llm.call_count());
            prop_assert!(output.rounds <= max_loop);
        }
    }
}
