// Cached submission list for one problem, with a list/detail toggle
use codebench_client::{ProblemService, ServiceError};
use codebench_common::types::Submission;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionView {
    List,
    /// Index into the cached entries
    Detail(usize),
}

#[derive(Debug, Clone)]
pub struct SubmissionHistoryView {
    problem_id: Option<u64>,
    entries: Vec<Submission>,
    loaded_at: Option<Instant>,
    view: SubmissionView,
    ttl: Duration,
}

impl Default for SubmissionHistoryView {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl SubmissionHistoryView {
    pub fn new(ttl: Duration) -> Self {
        Self {
            problem_id: None,
            entries: Vec::new(),
            loaded_at: None,
            view: SubmissionView::List,
            ttl,
        }
    }

    /// Forget everything cached and bind to `problem_id`
    pub fn reset_for(&mut self, problem_id: u64) {
        self.problem_id = Some(problem_id);
        self.entries.clear();
        self.loaded_at = None;
        self.view = SubmissionView::List;
    }

    /// Fetch and replace the cached list. On error the cache is untouched.
    #[instrument(skip(self, service))]
    pub async fn load(&mut self, service: &dyn ProblemService, problem_id: u64) -> Result<usize, ServiceError> {
        let entries = service.fetch_submissions(problem_id).await.map_err(|e| {
            warn!(problem_id = problem_id, error = %e, "Failed to load submissions");
            e
        })?;

        let selected = match self.problem_id {
            Some(current) if current == problem_id => self.detail().cloned(),
            _ => None,
        };
        self.problem_id = Some(problem_id);
        self.entries = entries;
        self.loaded_at = Some(Instant::now());

        // Indices shift across reloads; follow the selected submission itself
        self.view = match selected.and_then(|chosen| self.position_of(&chosen)) {
            Some(index) => SubmissionView::Detail(index),
            None => SubmissionView::List,
        };

        debug!(problem_id = problem_id, count = self.entries.len(), "Submissions loaded");
        Ok(self.entries.len())
    }

    /// Prepend a fresh submission without reloading
    pub fn record_new(&mut self, submission: Submission) {
        if self.problem_id.is_none() {
            self.problem_id = Some(submission.problem_id);
        }
        self.entries.insert(0, submission);
        if let SubmissionView::Detail(index) = self.view {
            self.view = SubmissionView::Detail(index + 1);
        }
    }

    pub fn needs_refresh(&self, problem_id: u64) -> bool {
        if self.problem_id != Some(problem_id) || self.entries.is_empty() {
            return true;
        }
        match self.loaded_at {
            Some(at) => at.elapsed() >= self.ttl,
            None => true,
        }
    }

    pub fn select_detail_at(&mut self, index: usize) -> bool {
        if index >= self.entries.len() {
            return false;
        }
        self.view = SubmissionView::Detail(index);
        true
    }

    /// Cached position of `submission`, by server id when it has one
    fn position_of(&self, submission: &Submission) -> Option<usize> {
        match submission.id {
            Some(id) => self.entries.iter().position(|s| s.id == Some(id)),
            None => self.entries.iter().position(|s| s == submission),
        }
    }

    /// Show `submission` in detail, adding it to the front if not cached
    pub fn select_detail(&mut self, submission: &Submission) {
        match self.position_of(submission) {
            Some(index) => self.view = SubmissionView::Detail(index),
            None => {
                self.entries.insert(0, submission.clone());
                self.view = SubmissionView::Detail(0);
            }
        }
    }

    pub fn select_list(&mut self) {
        self.view = SubmissionView::List;
    }

    pub fn view(&self) -> &SubmissionView {
        &self.view
    }

    pub fn detail(&self) -> Option<&Submission> {
        match self.view {
            SubmissionView::Detail(index) => self.entries.get(index),
            SubmissionView::List => None,
        }
    }

    pub fn entries(&self) -> &[Submission] {
        &self.entries
    }

    pub fn problem_id(&self) -> Option<u64> {
        self.problem_id
    }
}
