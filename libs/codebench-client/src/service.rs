// Collaborator contract consumed by the workbench

use crate::error::ServiceError;
use async_trait::async_trait;
use codebench_common::types::{
    Problem, ProblemDraft, RankingEntry, RunRequest, RunResult, Submission, SubmitRequest,
    SubmitResponse,
};

/// Problem catalogue, submission history and judge, as one service.
///
/// Ownership rules (who may update or delete a problem) are enforced by the
/// service and surface as `Forbidden`/`NotFound` errors.
#[async_trait]
pub trait ProblemService: Send + Sync {
    async fn fetch_problems(&self) -> Result<Vec<Problem>, ServiceError>;

    async fn fetch_problem(&self, id: u64) -> Result<Problem, ServiceError>;

    async fn fetch_my_problems(&self) -> Result<Vec<Problem>, ServiceError>;

    async fn create_problem(&self, draft: &ProblemDraft) -> Result<Problem, ServiceError>;

    async fn update_problem(&self, id: u64, draft: &ProblemDraft) -> Result<Problem, ServiceError>;

    async fn delete_problem(&self, id: u64) -> Result<(), ServiceError>;

    async fn fetch_submissions(&self, problem_id: u64) -> Result<Vec<Submission>, ServiceError>;

    async fn fetch_all_submissions(&self) -> Result<Vec<Submission>, ServiceError>;

    async fn fetch_ranking(&self) -> Result<Vec<RankingEntry>, ServiceError>;

    /// Judge call against a single input. Compile, runtime and time-limit
    /// failures come back as `Ok` with `error` populated.
    async fn run_solution(&self, request: &RunRequest) -> Result<RunResult, ServiceError>;

    /// Judge call against the full hidden suite
    async fn submit_solution(&self, request: &SubmitRequest) -> Result<SubmitResponse, ServiceError>;
}
