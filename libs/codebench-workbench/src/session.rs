/// Run and Submit against the judge, one request at a time
///
/// The session is cheap to clone; clones share one phase. A trigger that
/// arrives while a request is in flight is rejected rather than queued.
/// The in-flight marker is a guard, so the phase returns to a resting state
/// on every exit path, including the awaiting future being dropped. Results
/// that arrive after `teardown()` are discarded.
use chrono::Utc;
use codebench_client::{ErrorKind, Operation, ProblemService, ServiceError};
use codebench_common::types::{Language, RunRequest, RunResult, Submission, SubmissionStatus, SubmitRequest};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Where the session stands between and during requests.
///
/// `Idle` and `Errored` are both resting phases: either accepts a new Run or
/// Submit. A request that never reached the judge settles in `Errored`
/// instead of `Idle`; the message itself is carried by the returned outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Submitting,
    /// Last request failed to reach the judge
    Errored,
}

impl Phase {
    pub fn is_busy(&self) -> bool {
        matches!(self, Phase::Running | Phase::Submitting)
    }

    pub fn is_resting(&self) -> bool {
        !self.is_busy()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("another request is in flight ({0:?})")]
    Busy(Phase),

    #[error("no test case selected")]
    NoTestCase,

    #[error("session was torn down before the result arrived")]
    Detached,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub result: RunResult,
    /// Set when the request itself failed (not a judge verdict)
    pub failure: Option<ErrorKind>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub submission: Submission,
    pub failure: Option<ErrorKind>,
}

#[derive(Debug)]
struct SessionState {
    phase: Phase,
    generation: u64,
    latest_run: Option<RunResult>,
}

#[derive(Clone)]
pub struct ExecutionSession {
    service: Arc<dyn ProblemService>,
    state: Arc<Mutex<SessionState>>,
    lifetime: CancellationToken,
}

/// Marks one request in flight; settles the phase when dropped
struct InFlight {
    state: Arc<Mutex<SessionState>>,
    generation: u64,
    resting: Phase,
}

impl InFlight {
    fn settle(&mut self, phase: Phase) {
        self.resting = phase;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.generation == self.generation && state.phase.is_busy() {
            state.phase = self.resting;
        }
    }
}

impl ExecutionSession {
    pub fn new(service: Arc<dyn ProblemService>) -> Self {
        Self {
            service,
            state: Arc::new(Mutex::new(SessionState {
                phase: Phase::Idle,
                generation: 0,
                latest_run: None,
            })),
            lifetime: CancellationToken::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase().is_busy()
    }

    pub fn latest_run(&self) -> Option<RunResult> {
        self.lock().latest_run.clone()
    }

    pub fn clear_latest_run(&self) {
        self.lock().latest_run = None;
    }

    pub fn is_detached(&self) -> bool {
        self.lifetime.is_cancelled()
    }

    /// End the session's lifetime. In-flight results are dropped on arrival.
    pub fn teardown(&self) {
        self.lifetime.cancel();
        let mut state = self.lock();
        state.generation += 1;
        state.phase = Phase::Idle;
    }

    fn begin(&self, phase: Phase) -> Result<InFlight, SessionError> {
        if self.is_detached() {
            return Err(SessionError::Detached);
        }
        let mut state = self.lock();
        if state.phase.is_busy() {
            return Err(SessionError::Busy(state.phase));
        }
        state.generation += 1;
        state.phase = phase;
        Ok(InFlight {
            state: self.state.clone(),
            generation: state.generation,
            resting: Phase::Idle,
        })
    }

    fn is_current(&self, generation: u64) -> bool {
        !self.is_detached() && self.lock().generation == generation
    }

    /// Run `code` against one input. `None` means no test case is selected.
    pub async fn run(
        &self,
        problem_id: u64,
        language: Language,
        code: impl Into<String>,
        input: Option<String>,
    ) -> Result<RunOutcome, SessionError> {
        let input = input.ok_or(SessionError::NoTestCase)?;
        let mut guard = self.begin(Phase::Running)?;
        let request = RunRequest {
            problem_id,
            language,
            code: code.into(),
            input,
        };

        info!(problem_id = problem_id, language = %language, "Running code");
        let response = self.service.run_solution(&request).await;

        if !self.is_current(guard.generation) {
            warn!(problem_id = problem_id, "Discarding run result for a detached session");
            return Err(SessionError::Detached);
        }

        let (result, failure) = match response {
            Ok(result) => {
                info!(problem_id = problem_id, judge_error = result.is_failure(), "Run finished");
                (result, None)
            }
            Err(e) => {
                guard.settle(Phase::Errored);
                (failed_run(&e), Some(e.kind()))
            }
        };

        self.lock().latest_run = Some(result.clone());
        Ok(RunOutcome { result, failure })
    }

    /// Submit against the full suite. `on_complete` sees the resulting
    /// submission, including a synthesised one when the request failed.
    pub async fn submit<F>(
        &self,
        problem_id: u64,
        language: Language,
        code: impl Into<String>,
        on_complete: F,
    ) -> Result<SubmitOutcome, SessionError>
    where
        F: FnOnce(&Submission),
    {
        let mut guard = self.begin(Phase::Submitting)?;
        let request = SubmitRequest {
            problem_id,
            language,
            code: code.into(),
        };

        info!(problem_id = problem_id, language = %language, "Submitting code");
        let response = self.service.submit_solution(&request).await;

        if !self.is_current(guard.generation) {
            warn!(problem_id = problem_id, "Discarding submit result for a detached session");
            return Err(SessionError::Detached);
        }

        let (status, output, language, failure) = match response {
            Ok(response) => {
                info!(problem_id = problem_id, status = %response.status, "Submission judged");
                (
                    response.status,
                    response.output,
                    response.language.unwrap_or(request.language),
                    None,
                )
            }
            Err(e) => {
                guard.settle(Phase::Errored);
                warn!(problem_id = problem_id, error = %e, "Submit request failed");
                (
                    SubmissionStatus::Error,
                    e.user_message(Operation::Submit),
                    request.language,
                    Some(e.kind()),
                )
            }
        };

        let submission = Submission {
            id: None,
            problem_id,
            language,
            code: request.code,
            status,
            output,
            created_at: Utc::now(),
            username: None,
            problem_title: None,
        };

        drop(guard);
        on_complete(&submission);
        Ok(SubmitOutcome { submission, failure })
    }
}

fn failed_run(err: &ServiceError) -> RunResult {
    warn!(error = %err, "Run request failed");
    RunResult {
        output: String::new(),
        error: Some(err.user_message(Operation::Run)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{accepted, ScriptedService};
    use codebench_client::error::SESSION_EXPIRED_MESSAGE;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn session(service: &Arc<ScriptedService>) -> ExecutionSession {
        ExecutionSession::new(service.clone())
    }

    #[tokio::test]
    async fn test_run_success_returns_to_idle() {
        let service = Arc::new(ScriptedService::new());
        let session = session(&service);

        let outcome = session
            .run(1, Language::Python, "print(input())", Some("5".to_string()))
            .await
            .unwrap();

        assert_eq!(outcome.result.output, "5");
        assert_eq!(outcome.failure, None);
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.latest_run(), Some(outcome.result));
    }

    #[tokio::test]
    async fn test_run_without_case_issues_nothing() {
        let service = Arc::new(ScriptedService::new());
        let session = session(&service);

        let err = session.run(1, Language::Python, "x", None).await.unwrap_err();

        assert_eq!(err, SessionError::NoTestCase);
        assert_eq!(service.run_calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_judge_error_is_a_result() {
        let service = Arc::new(ScriptedService::new());
        service.push_run(Ok(RunResult {
            output: String::new(),
            error: Some("SyntaxError: invalid syntax".to_string()),
        }));
        let session = session(&service);

        let outcome = session.run(1, Language::Python, "def", Some(String::new())).await.unwrap();

        assert_eq!(outcome.failure, None);
        assert_eq!(outcome.result.display_text(), "SyntaxError: invalid syntax");
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_transport_failure_is_rendered_and_retriggerable() {
        let service = Arc::new(ScriptedService::new());
        service.push_run(Err(ServiceError::Network("request timed out".to_string())));
        let session = session(&service);

        let outcome = session.run(1, Language::Cpp, "int main(){}", Some("1".to_string())).await.unwrap();

        assert_eq!(
            outcome.result,
            RunResult {
                output: String::new(),
                error: Some("Failed to run code".to_string())
            }
        );
        assert_eq!(outcome.failure, Some(ErrorKind::Network));
        assert_eq!(session.phase(), Phase::Errored);
        assert!(session.phase().is_resting());

        let again = session.run(1, Language::Cpp, "int main(){}", Some("1".to_string())).await.unwrap();
        assert_eq!(again.failure, None);
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_second_trigger_while_running_is_rejected() {
        let service = Arc::new(ScriptedService::gated());
        let session = session(&service);

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.run(1, Language::Python, "x", Some("1".to_string())).await }
        });
        service.entered.notified().await;
        assert_eq!(session.phase(), Phase::Running);

        let run_again = session.run(1, Language::Python, "x", Some("1".to_string())).await;
        let submit = session.submit(1, Language::Python, "x", |_| {}).await;

        assert_eq!(run_again.unwrap_err(), SessionError::Busy(Phase::Running));
        assert_eq!(submit.unwrap_err(), SessionError::Busy(Phase::Running));
        assert_eq!(service.run_calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.submit_calls.load(Ordering::SeqCst), 0);

        service.release();
        first.await.unwrap().unwrap();
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_run_rejected_while_submitting() {
        let service = Arc::new(ScriptedService::gated());
        let session = session(&service);

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.submit(1, Language::Java, "class A {}", |_| {}).await }
        });
        service.entered.notified().await;

        let err = session.run(1, Language::Java, "x", Some("1".to_string())).await.unwrap_err();
        assert_eq!(err, SessionError::Busy(Phase::Submitting));

        service.release();
        let outcome = pending.await.unwrap().unwrap();
        assert_eq!(outcome.submission.status, SubmissionStatus::Accepted);
        assert_eq!(outcome.submission.language, Language::Java);
    }

    #[tokio::test]
    async fn test_dropped_future_clears_busy_phase() {
        let service = Arc::new(ScriptedService::gated());
        let session = session(&service);

        let timed_out = tokio::time::timeout(
            Duration::from_millis(50),
            session.run(1, Language::Python, "x", Some("1".to_string())),
        )
        .await;

        assert!(timed_out.is_err());
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_submit_invokes_callback_once() {
        let service = Arc::new(ScriptedService::new());
        service.push_submit(Ok(accepted()));
        let session = session(&service);

        let mut seen = Vec::new();
        let outcome = session
            .submit(2, Language::Python, "pass", |s| seen.push(s.clone()))
            .await
            .unwrap();

        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], outcome.submission);
        assert_eq!(outcome.submission.status, SubmissionStatus::Accepted);
        assert_eq!(outcome.submission.output, "All tests passed");
        assert_eq!(outcome.submission.problem_id, 2);
    }

    #[tokio::test]
    async fn test_submit_failure_synthesises_error_submission() {
        let service = Arc::new(ScriptedService::new());
        service.push_submit(Err(ServiceError::Auth("unauthorized".to_string())));
        let session = session(&service);

        let mut calls = 0;
        let outcome = session
            .submit(2, Language::Cpp, "int main(){}", |_| calls += 1)
            .await
            .unwrap();

        assert_eq!(calls, 1);
        assert_eq!(outcome.failure, Some(ErrorKind::Auth));
        assert_eq!(outcome.submission.status, SubmissionStatus::Error);
        assert_eq!(outcome.submission.output, SESSION_EXPIRED_MESSAGE);
        assert_eq!(outcome.submission.id, None);
        assert_eq!(session.phase(), Phase::Errored);
    }

    #[tokio::test]
    async fn test_teardown_discards_late_result() {
        let service = Arc::new(ScriptedService::gated());
        let session = session(&service);

        let pending = tokio::spawn({
            let session = session.clone();
            async move {
                let mut called = false;
                let result = session.submit(1, Language::Python, "x", |_| called = true).await;
                (result, called)
            }
        });
        service.entered.notified().await;

        session.teardown();
        service.release();
        let (result, called) = pending.await.unwrap();

        assert_eq!(result.unwrap_err(), SessionError::Detached);
        assert!(!called);
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(
            session.run(1, Language::Python, "x", Some("1".to_string())).await.unwrap_err(),
            SessionError::Detached
        );
    }
}
