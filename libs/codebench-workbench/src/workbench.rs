/// The problem-solving workbench
///
/// `Workbench` owns every component and is the only place cross-component
/// state changes: opening a problem rebuilds boilerplate, tabs, editor and
/// history; a submit result lands in history and flips the description
/// panel to its detail view; any authentication failure raises the
/// re-login prompt. Front ends drive it through these methods and render
/// from its getters.
use crate::boilerplate::LanguageBoilerplateStore;
use crate::drag::{Axis, DragResizeController, Point, PointerLocks, Rect};
use crate::editor::EditorBuffer;
use crate::history::{SubmissionHistoryView, SubmissionView};
use crate::session::{ExecutionSession, Phase, SessionError};
use crate::testcases::{CaseField, CaseId, TestCaseTabset};
use codebench_client::{ErrorKind, ProblemService, ServiceError};
use codebench_common::config::ClientConfig;
use codebench_common::types::{Language, Problem, RunResult, Submission};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DescriptionTab {
    #[default]
    Description,
    Submissions,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitState {
    /// Description pane width, percent of the workbench
    pub horizontal: f64,
    /// Editor height, percent of the right-hand column
    pub vertical: f64,
}

#[derive(Debug, Error)]
pub enum WorkbenchError {
    #[error("no problem is open")]
    NoProblem,

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

pub struct Workbench {
    service: Arc<dyn ProblemService>,
    session: ExecutionSession,
    problem: Option<Problem>,
    boilerplate: LanguageBoilerplateStore,
    test_cases: TestCaseTabset,
    editor: EditorBuffer,
    history: SubmissionHistoryView,
    horizontal: DragResizeController,
    vertical: DragResizeController,
    tab: DescriptionTab,
    inline_result: Option<RunResult>,
    login_required: bool,
}

impl Workbench {
    pub fn new(service: Arc<dyn ProblemService>, locks: PointerLocks) -> Self {
        let boilerplate = LanguageBoilerplateStore::new();
        let language = Language::default();
        Self {
            session: ExecutionSession::new(service.clone()),
            service,
            problem: None,
            editor: EditorBuffer::new(language, boilerplate.get(language).template),
            boilerplate,
            test_cases: TestCaseTabset::new(),
            history: SubmissionHistoryView::default(),
            horizontal: DragResizeController::new(Axis::Horizontal, locks.clone()),
            vertical: DragResizeController::new(Axis::Vertical, locks),
            tab: DescriptionTab::Description,
            inline_result: None,
            login_required: false,
        }
    }

    pub fn from_config(service: Arc<dyn ProblemService>, locks: PointerLocks, config: &ClientConfig) -> Self {
        Self::new(service, locks).with_submissions_ttl(config.submissions_ttl)
    }

    pub fn with_submissions_ttl(mut self, ttl: Duration) -> Self {
        self.history = SubmissionHistoryView::new(ttl);
        self
    }

    fn note_failure(&mut self, kind: ErrorKind) {
        if kind == ErrorKind::Auth {
            warn!("Credentials rejected, asking the user to log in again");
            self.login_required = true;
        }
    }

    fn open_problem_id(&self) -> Result<u64, WorkbenchError> {
        self.problem.as_ref().map(|p| p.id).ok_or(WorkbenchError::NoProblem)
    }

    pub async fn open_problem(&mut self, id: u64) -> Result<&Problem, WorkbenchError> {
        let problem = match self.service.fetch_problem(id).await {
            Ok(problem) => problem,
            Err(e) => {
                warn!(problem_id = id, error = %e, "Failed to load problem");
                self.note_failure(e.kind());
                return Err(e.into());
            }
        };

        self.boilerplate.reset();
        self.boilerplate.apply_overrides(&problem.overrides());
        self.test_cases = TestCaseTabset::from_cases(problem.test_cases.clone());

        let language = self.editor.language();
        self.editor.reset(language, self.boilerplate.get(language).template);
        self.history.reset_for(problem.id);
        self.tab = DescriptionTab::Description;
        self.inline_result = None;
        self.session.clear_latest_run();

        info!(problem_id = problem.id, cases = self.test_cases.len(), "Problem opened");
        Ok(self.problem.insert(problem))
    }

    /// Switch language. The editor is reset to the new template and any
    /// edits in the previous language are discarded.
    pub fn select_language(&mut self, language: Language) {
        debug!(language = %language, "Language selected");
        self.editor.reset(language, self.boilerplate.get(language).template);
    }

    pub fn edit_code(&mut self, text: impl Into<String>) {
        self.editor.edit(text);
    }

    /// Focus a test case tab; the previous inline result no longer applies
    pub fn select_test_case(&mut self, index: usize) -> bool {
        if !self.test_cases.set_active(index) {
            return false;
        }
        self.inline_result = None;
        true
    }

    pub fn add_test_case(&mut self) -> CaseId {
        self.test_cases.add_case()
    }

    pub fn update_test_case(&mut self, id: CaseId, field: CaseField, value: impl Into<String>) -> bool {
        self.test_cases.update_case(id, field, value)
    }

    pub fn remove_test_case(&mut self, id: CaseId) -> bool {
        let removed = self.test_cases.remove_case(id);
        if removed {
            self.inline_result = None;
        }
        removed
    }

    pub fn begin_drag(&mut self, axis: Axis) -> bool {
        match axis {
            Axis::Horizontal => self.horizontal.begin_drag(),
            Axis::Vertical => self.vertical.begin_drag(),
        }
    }

    /// Route a pointer move to whichever divider is being dragged
    pub fn pointer_move(&mut self, pointer: Point, container: Rect) -> Option<f64> {
        if self.horizontal.is_dragging() {
            self.horizontal.on_pointer_move(pointer, container)
        } else if self.vertical.is_dragging() {
            self.vertical.on_pointer_move(pointer, container)
        } else {
            None
        }
    }

    /// Pointer released anywhere in the window
    pub fn pointer_up(&mut self) -> bool {
        let horizontal = self.horizontal.end_drag();
        let vertical = self.vertical.end_drag();
        horizontal || vertical
    }

    pub fn split(&self) -> SplitState {
        SplitState {
            horizontal: self.horizontal.percent(),
            vertical: self.vertical.percent(),
        }
    }

    /// Run the editor's code against the active test case
    pub async fn run(&mut self) -> Result<RunResult, WorkbenchError> {
        let problem_id = self.open_problem_id()?;
        let input = self.test_cases.active_case().map(|case| case.input.clone());

        let outcome = self
            .session
            .run(problem_id, self.editor.language(), self.editor.source(), input)
            .await?;

        if let Some(kind) = outcome.failure {
            self.note_failure(kind);
        }
        self.inline_result = Some(outcome.result.clone());
        Ok(outcome.result)
    }

    /// Submit the editor's code; the result opens in the submissions panel
    pub async fn submit(&mut self) -> Result<Submission, WorkbenchError> {
        let problem_id = self.open_problem_id()?;
        let history = &mut self.history;

        let outcome = self
            .session
            .submit(problem_id, self.editor.language(), self.editor.source(), |submission| {
                history.record_new(submission.clone())
            })
            .await?;

        if let Some(kind) = outcome.failure {
            self.note_failure(kind);
        }
        self.tab = DescriptionTab::Submissions;
        self.history.select_detail_at(0);
        Ok(outcome.submission)
    }

    /// Switch the description panel. The submissions tab opens on the list
    /// and fetches when the cache is stale.
    pub async fn show_description_tab(&mut self, tab: DescriptionTab) -> Result<(), WorkbenchError> {
        self.tab = tab;
        if tab != DescriptionTab::Submissions {
            return Ok(());
        }

        self.history.select_list();
        let Some(problem_id) = self.problem.as_ref().map(|p| p.id) else {
            return Ok(());
        };
        if !self.history.needs_refresh(problem_id) {
            return Ok(());
        }

        if let Err(e) = self.history.load(self.service.as_ref(), problem_id).await {
            self.note_failure(e.kind());
            return Err(e.into());
        }
        Ok(())
    }

    pub fn select_submission(&mut self, index: usize) -> bool {
        self.history.select_detail_at(index)
    }

    pub fn show_submission_list(&mut self) {
        self.history.select_list();
    }

    pub fn login_required(&self) -> bool {
        self.login_required
    }

    pub fn acknowledge_login(&mut self) {
        self.login_required = false;
    }

    /// Detach from in-flight requests and release any pointer lock
    pub fn teardown(&mut self) {
        if !self.session.is_detached() {
            debug!("Workbench torn down");
        }
        self.session.teardown();
        self.pointer_up();
    }

    pub fn problem(&self) -> Option<&Problem> {
        self.problem.as_ref()
    }

    pub fn editor(&self) -> &EditorBuffer {
        &self.editor
    }

    pub fn boilerplate(&self) -> &LanguageBoilerplateStore {
        &self.boilerplate
    }

    pub fn test_cases(&self) -> &TestCaseTabset {
        &self.test_cases
    }

    pub fn history(&self) -> &SubmissionHistoryView {
        &self.history
    }

    pub fn submission_view(&self) -> &SubmissionView {
        self.history.view()
    }

    pub fn description_tab(&self) -> DescriptionTab {
        self.tab
    }

    pub fn inline_result(&self) -> Option<&RunResult> {
        self.inline_result.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    /// Handle for triggering from another task
    pub fn session(&self) -> ExecutionSession {
        self.session.clone()
    }
}

impl Drop for Workbench {
    fn drop(&mut self) {
        self.teardown();
    }
}
