// Scripted problem service for workbench tests
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use codebench_client::{ProblemService, ServiceError};
use codebench_common::types::{
    Difficulty, Language, Problem, ProblemDraft, RankingEntry, RunRequest, RunResult, Submission,
    SubmissionStatus, SubmitRequest, SubmitResponse, TestCase,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::{Notify, Semaphore};

/// Replays queued responses in order. With `gated()` every run/submit call
/// parks until `release()` so tests can observe the in-flight phase.
#[derive(Default)]
pub struct ScriptedService {
    pub problem: Mutex<Option<Result<Problem, ServiceError>>>,
    pub run_results: Mutex<VecDeque<Result<RunResult, ServiceError>>>,
    pub submit_results: Mutex<VecDeque<Result<SubmitResponse, ServiceError>>>,
    pub submission_lists: Mutex<VecDeque<Result<Vec<Submission>, ServiceError>>>,
    pub run_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub submissions_calls: AtomicUsize,
    pub entered: Notify,
    gate: Option<Semaphore>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn with_problem(self, problem: Problem) -> Self {
        *self.problem.lock().unwrap() = Some(Ok(problem));
        self
    }

    pub fn push_run(&self, result: Result<RunResult, ServiceError>) {
        self.run_results.lock().unwrap().push_back(result);
    }

    pub fn push_submit(&self, result: Result<SubmitResponse, ServiceError>) {
        self.submit_results.lock().unwrap().push_back(result);
    }

    pub fn push_submissions(&self, result: Result<Vec<Submission>, ServiceError>) {
        self.submission_lists.lock().unwrap().push_back(result);
    }

    async fn pass_gate(&self) {
        self.entered.notify_one();
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
    }
}

#[async_trait]
impl ProblemService for ScriptedService {
    async fn fetch_problems(&self) -> Result<Vec<Problem>, ServiceError> {
        Ok(self.problem.lock().unwrap().iter().filter_map(|p| p.clone().ok()).collect())
    }

    async fn fetch_problem(&self, id: u64) -> Result<Problem, ServiceError> {
        match self.problem.lock().unwrap().clone() {
            Some(result) => result,
            None => Ok(sample_problem(id)),
        }
    }

    async fn fetch_my_problems(&self) -> Result<Vec<Problem>, ServiceError> {
        Ok(Vec::new())
    }

    async fn create_problem(&self, draft: &ProblemDraft) -> Result<Problem, ServiceError> {
        let mut problem = sample_problem(100);
        problem.title = draft.title.clone();
        Ok(problem)
    }

    async fn update_problem(&self, id: u64, draft: &ProblemDraft) -> Result<Problem, ServiceError> {
        let mut problem = sample_problem(id);
        problem.title = draft.title.clone();
        Ok(problem)
    }

    async fn delete_problem(&self, _id: u64) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn fetch_submissions(&self, _problem_id: u64) -> Result<Vec<Submission>, ServiceError> {
        self.submissions_calls.fetch_add(1, Ordering::SeqCst);
        self.submission_lists.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn fetch_all_submissions(&self) -> Result<Vec<Submission>, ServiceError> {
        Ok(Vec::new())
    }

    async fn fetch_ranking(&self) -> Result<Vec<RankingEntry>, ServiceError> {
        Ok(Vec::new())
    }

    async fn run_solution(&self, request: &RunRequest) -> Result<RunResult, ServiceError> {
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await;
        let scripted = self.run_results.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(RunResult {
                output: request.input.clone(),
                error: None,
            })
        })
    }

    async fn submit_solution(&self, _request: &SubmitRequest) -> Result<SubmitResponse, ServiceError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await;
        let scripted = self.submit_results.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(accepted()))
    }
}

pub fn sample_problem(id: u64) -> Problem {
    Problem {
        id,
        title: "Two Sum".to_string(),
        description: "Add two numbers".to_string(),
        difficulty: Difficulty::Easy,
        tags: Some("math".to_string()),
        owner_id: Some(1),
        owner_username: Some("alice".to_string()),
        test_cases: vec![TestCase::new("1 2", "3"), TestCase::new("4 5", "9")],
        templates: Value::Null,
        drivers: Value::Null,
        time_limits: Value::Null,
    }
}

pub fn accepted() -> SubmitResponse {
    SubmitResponse {
        status: SubmissionStatus::Accepted,
        output: "All tests passed".to_string(),
        language: None,
        message: Some("Submission processed".to_string()),
    }
}

pub fn stored_submission(id: u64, problem_id: u64, status: SubmissionStatus) -> Submission {
    Submission {
        id: Some(id),
        problem_id,
        language: Language::Python,
        code: "print(1)".to_string(),
        status,
        output: format!("output {}", id),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        username: Some("alice".to_string()),
        problem_title: None,
    }
}
