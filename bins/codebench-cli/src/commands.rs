// CLI commands backed by the workbench and the problem service
use anyhow::{anyhow, bail, Context, Result};
use codebench_client::{HttpProblemService, Operation, ProblemService, ServiceError};
use codebench_common::config::ClientConfig;
use codebench_common::types::{Language, Problem, Submission};
use codebench_workbench::authoring::ProblemAuthoring;
use codebench_workbench::{
    AccountStats, DescriptionTab, LanguageBoilerplateStore, NoopCursorHost, PointerLocks, Workbench, WorkbenchError,
};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

fn connect(config: &ClientConfig) -> Result<Arc<dyn ProblemService>> {
    let service = HttpProblemService::new(config).context("Failed to build problem service client")?;
    Ok(Arc::new(service))
}

fn open_workbench(config: &ClientConfig) -> Result<Workbench> {
    let locks = PointerLocks::new(Arc::new(NoopCursorHost));
    Ok(Workbench::from_config(connect(config)?, locks, config))
}

/// Turn a service failure into the line a user would see
fn failed(operation: Operation) -> impl Fn(ServiceError) -> anyhow::Error {
    move |e| anyhow!(e.user_message(operation))
}

fn workbench_failed(operation: Operation) -> impl Fn(WorkbenchError) -> anyhow::Error {
    move |e| match e {
        WorkbenchError::Service(e) => anyhow!(e.user_message(operation)),
        other => anyhow!(other),
    }
}

fn login_hint(workbench: &Workbench) {
    if workbench.login_required() {
        println!("\n🔑 Your session has expired. Refresh CODEBENCH_TOKEN or CODEBENCH_REFRESH_TOKEN and try again.");
    }
}

fn print_problem_row(problem: &Problem) {
    let owner = problem
        .owner_username
        .as_deref()
        .map(|u| format!(" (by {})", u))
        .unwrap_or_default();
    println!("  #{:<5} {:<7} {}{}", problem.id, problem.difficulty.to_string(), problem.title, owner);
}

fn print_submission(submission: &Submission) {
    let marker = if submission.status.is_accepted() { "✅" } else { "❌" };
    println!(
        "{} {} [{}] {}",
        marker,
        submission.status,
        submission.language.display_name(),
        submission.created_at.format("%Y-%m-%d %H:%M:%S")
    );
}

fn read_source(file: &Path) -> Result<String> {
    fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}

pub async fn list_problems(config: &ClientConfig, mine: bool) -> Result<()> {
    let service = connect(config)?;
    let problems = if mine {
        service.fetch_my_problems().await
    } else {
        service.fetch_problems().await
    }
    .map_err(failed(Operation::LoadProblem))?;

    if problems.is_empty() {
        println!("📭 No problems found");
        return Ok(());
    }

    println!("📚 {} problem(s):", problems.len());
    for problem in &problems {
        print_problem_row(problem);
    }
    Ok(())
}

pub async fn show_problem(config: &ClientConfig, id: u64, language: Language) -> Result<()> {
    let mut workbench = open_workbench(config)?;
    let result = workbench.open_problem(id).await.cloned();
    let problem = match result {
        Ok(problem) => problem,
        Err(e) => {
            login_hint(&workbench);
            return Err(workbench_failed(Operation::LoadProblem)(e));
        }
    };
    workbench.select_language(language);

    println!("📄 #{} {} [{}]", problem.id, problem.title, problem.difficulty);
    if let Some(tags) = problem.tags.as_deref().filter(|t| !t.is_empty()) {
        println!("🏷️  {}", tags);
    }
    println!("\n{}\n", problem.description);

    for (index, case) in workbench.test_cases().cases().iter().enumerate() {
        println!("🧪 Case {}", index + 1);
        println!("  input:    {}", case.input);
        println!("  expected: {}", case.expected_output);
    }

    let limit = workbench.boilerplate().get(language).timeout;
    println!("\n📝 Starter code ({}, {}s limit):", language.display_name(), limit);
    println!("{}", workbench.editor().source());
    Ok(())
}

pub async fn run_solution(config: &ClientConfig, id: u64, language: Language, file: &Path, case: usize) -> Result<()> {
    let source = read_source(file)?;
    let mut workbench = open_workbench(config)?;
    workbench
        .open_problem(id)
        .await
        .map_err(workbench_failed(Operation::LoadProblem))?;

    workbench.select_language(language);
    workbench.edit_code(source);
    if case == 0 || !workbench.select_test_case(case - 1) {
        bail!(
            "Problem #{} has {} test case(s); case {} does not exist",
            id,
            workbench.test_cases().len(),
            case
        );
    }

    println!("🚀 Running {} against case {}...", language.display_name(), case);
    let result = workbench.run().await.map_err(workbench_failed(Operation::Run))?;

    match result.error.as_deref() {
        Some(error) => println!("❌ {}", error),
        None => {
            println!("✅ Output:\n{}", result.output);
            let expected = workbench
                .test_cases()
                .active_case()
                .map(|c| c.expected_output.trim().to_string())
                .unwrap_or_default();
            if !expected.is_empty() && expected != result.output.trim() {
                println!("⚠️  Expected:\n{}", expected);
            }
        }
    }
    login_hint(&workbench);
    Ok(())
}

pub async fn submit_solution(config: &ClientConfig, id: u64, language: Language, file: &Path) -> Result<()> {
    let source = read_source(file)?;
    let mut workbench = open_workbench(config)?;
    workbench
        .open_problem(id)
        .await
        .map_err(workbench_failed(Operation::LoadProblem))?;

    workbench.select_language(language);
    workbench.edit_code(source);

    println!("📨 Submitting {} solution...", language.display_name());
    let submission = workbench.submit().await.map_err(workbench_failed(Operation::Submit))?;

    print_submission(&submission);
    if !submission.output.is_empty() {
        println!("{}", submission.output);
    }
    login_hint(&workbench);
    Ok(())
}

pub async fn show_submissions(config: &ClientConfig, id: Option<u64>, all: bool) -> Result<()> {
    let submissions = match (id, all) {
        (Some(id), _) => {
            let mut workbench = open_workbench(config)?;
            workbench
                .open_problem(id)
                .await
                .map_err(workbench_failed(Operation::LoadProblem))?;
            if let Err(e) = workbench.show_description_tab(DescriptionTab::Submissions).await {
                login_hint(&workbench);
                return Err(workbench_failed(Operation::LoadSubmissions)(e));
            }
            workbench.history().entries().to_vec()
        }
        (None, true) => connect(config)?
            .fetch_all_submissions()
            .await
            .map_err(failed(Operation::LoadSubmissions))?,
        (None, false) => bail!("Pass a problem id or --all"),
    };

    if submissions.is_empty() {
        println!("📭 No submissions yet");
        return Ok(());
    }

    for submission in &submissions {
        if let Some(title) = submission.problem_title.as_deref() {
            print!("{}: ", title);
        }
        print_submission(submission);
    }
    Ok(())
}

pub async fn show_ranking(config: &ClientConfig) -> Result<()> {
    let ranking = connect(config)?
        .fetch_ranking()
        .await
        .map_err(failed(Operation::LoadRanking))?;

    println!("🏆 Leaderboard");
    println!("  {:<5} {:<20} {:>7} {:>12} {:>11}", "rank", "user", "solved", "submissions", "acceptance");
    for entry in &ranking {
        println!(
            "  {:<5} {:<20} {:>7} {:>12} {:>10.1}%",
            entry.rank, entry.username, entry.solved_problems, entry.total_submissions, entry.acceptance_rate
        );
    }
    Ok(())
}

pub async fn show_account(config: &ClientConfig) -> Result<()> {
    let submissions = connect(config)?
        .fetch_all_submissions()
        .await
        .map_err(failed(Operation::LoadSubmissions))?;
    let stats = AccountStats::from_submissions(&submissions);

    println!("👤 Account summary");
    println!("  Total submissions:    {}", stats.total_submissions);
    println!("  Accepted submissions: {}", stats.accepted_submissions);
    println!("  Problems solved:      {}", stats.solved_problems);
    println!("  Acceptance rate:      {:.1}%", stats.acceptance_rate());
    Ok(())
}

/// Create when `id` is `None`, otherwise replace problem `id`
pub async fn save_problem(config: &ClientConfig, id: Option<u64>, file: &Path) -> Result<()> {
    let form = ProblemAuthoring::load_draft_file(file)?;
    let draft = form.to_draft()?;
    let service = connect(config)?;

    let saved = match id {
        None => service.create_problem(&draft).await,
        Some(id) => service.update_problem(id, &draft).await,
    }
    .map_err(failed(Operation::SaveProblem))?;

    let verb = if id.is_some() { "updated" } else { "created" };
    println!("✅ Problem #{} '{}' {} successfully!", saved.id, saved.title, verb);
    Ok(())
}

pub async fn delete_problem(config: &ClientConfig, id: u64, yes: bool) -> Result<()> {
    println!("🗑️  Deleting problem #{}", id);

    if !yes {
        print!("⚠️  This permanently removes the problem and its test cases. Continue? [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("❌ Aborted");
            return Ok(());
        }
    }

    connect(config)?
        .delete_problem(id)
        .await
        .map_err(failed(Operation::DeleteProblem))?;

    println!("✅ Problem #{} deleted", id);
    Ok(())
}

pub fn show_boilerplate(language: Language, overrides: Option<&Path>) -> Result<()> {
    let mut store = LanguageBoilerplateStore::new();
    if let Some(path) = overrides {
        let applied = store.load_overrides_file(path)?;
        println!("📝 Applied {} override(s) from {}", applied, path.display());
    }

    let entry = store.get(language);
    println!("⏱️  {} time limit: {}s", language.display_name(), entry.timeout);
    println!("\n--- template ---\n{}", entry.template);
    println!("\n--- driver ---\n{}", entry.driver);
    Ok(())
}
