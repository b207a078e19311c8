mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use codebench_common::config::ClientConfig;
use codebench_common::types::Language;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "codebench")]
#[command(about = "Codebench CLI - Browse problems, run and submit solutions", long_about = None)]
struct Cli {
    /// Problem service base URL (overrides CODEBENCH_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all problems
    Problems,

    /// List problems you created
    Mine,

    /// Show a problem with its test cases and starter code
    Show {
        id: u64,

        /// Language of the starter code to print
        #[arg(short, long, default_value = "python")]
        lang: Language,
    },

    /// Run a solution against one visible test case
    Run {
        id: u64,

        #[arg(short, long)]
        lang: Language,

        /// Source file holding the solution
        #[arg(short, long)]
        file: PathBuf,

        /// Test case number, starting at 1
        #[arg(short, long, default_value = "1")]
        case: usize,
    },

    /// Submit a solution against the full test suite
    Submit {
        id: u64,

        #[arg(short, long)]
        lang: Language,

        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show submission history for a problem, or all of yours
    Submissions {
        /// Problem id
        id: Option<u64>,

        #[arg(long, conflicts_with = "id")]
        all: bool,
    },

    /// Show the leaderboard
    Ranking,

    /// Summarise your submissions: total, accepted and problems solved
    Account,

    /// Create a problem from a JSON draft
    Create {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Replace a problem you own with a JSON draft
    Update {
        id: u64,

        #[arg(short, long)]
        file: PathBuf,
    },

    /// Delete a problem you own
    Delete {
        id: u64,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Print the starter template, driver and time limit for a language
    Boilerplate {
        #[arg(short, long)]
        lang: Language,

        /// JSON file with templates/drivers/time_limits overrides
        #[arg(short, long)]
        overrides: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = std::env::var("CODEBENCH_LOG_JSON")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    // Logs go to stderr so command output stays pipeable
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    debug!(api_url = %config.api_url, "Configuration loaded");

    match cli.command {
        Commands::Problems => commands::list_problems(&config, false).await?,
        Commands::Mine => commands::list_problems(&config, true).await?,
        Commands::Show { id, lang } => commands::show_problem(&config, id, lang).await?,
        Commands::Run { id, lang, file, case } => {
            commands::run_solution(&config, id, lang, &file, case).await?;
        }
        Commands::Submit { id, lang, file } => {
            commands::submit_solution(&config, id, lang, &file).await?;
        }
        Commands::Submissions { id, all } => commands::show_submissions(&config, id, all).await?,
        Commands::Ranking => commands::show_ranking(&config).await?,
        Commands::Account => commands::show_account(&config).await?,
        Commands::Create { file } => commands::save_problem(&config, None, &file).await?,
        Commands::Update { id, file } => commands::save_problem(&config, Some(id), &file).await?,
        Commands::Delete { id, yes } => commands::delete_problem(&config, id, yes).await?,
        Commands::Boilerplate { lang, overrides } => {
            commands::show_boilerplate(lang, overrides.as_deref())?;
        }
    }

    Ok(())
}
