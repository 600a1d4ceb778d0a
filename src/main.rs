use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use redminecli::commands;
use redminecli::config;
use redminecli::redmine::RedmineClient;
use redminecli::store::FileSessionStore;
use redminecli::timer::{LogRequest, PriorTimer, SystemClock, TimerManager};

const LOG_ENV: &str = "REDMINECLI_LOG";
const LOG_FORMAT_ENV: &str = "REDMINECLI_LOG_FORMAT";

#[derive(Parser)]
#[command(name = "redminecli")]
#[command(about = "A command line companion for Redmine: tasks, a work timer, and time logging")]
#[command(version)]
struct Cli {
    /// Directory holding config.json and timer.json [default: ~/.redminecli]
    #[arg(long, global = true, env = "REDMINECLI_HOME")]
    config_dir: Option<PathBuf>,

    /// Print debug logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the Redmine URL and API key
    Config {
        /// The URL of your Redmine instance
        #[arg(long)]
        url: Option<String>,
        /// Your Redmine API key
        #[arg(long)]
        key: Option<String>,
    },

    /// Show the current configuration
    Credentials,

    /// List tasks assigned to you
    Tasks {
        /// Only show tasks with this status (case-insensitive)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Log time worked on an issue
    Log {
        /// Issue ID
        #[arg(long, allow_negative_numbers = true)]
        issue_id: i64,
        /// Hours worked, e.g. 2.5
        #[arg(long, allow_negative_numbers = true)]
        hours: f64,
        /// Activity name (case-insensitive), e.g. Development
        #[arg(long)]
        activity: String,
        /// Description of the work done
        #[arg(short = 'm', long, default_value = "")]
        comment: String,
    },

    /// List your recent time entries
    TimeEntries {
        /// Only entries for this issue
        #[arg(long)]
        issue_id: Option<i64>,
        /// Number of entries to show
        #[arg(long, default_value_t = commands::entries::DEFAULT_LIMIT)]
        limit: u32,
    },

    /// List time entry activities
    Activities,

    /// List projects with their IDs
    Projects,

    /// Start a timer for an issue (stops any running timer)
    Start {
        /// Issue ID
        #[arg(long, allow_negative_numbers = true)]
        issue_id: i64,
        /// Log the time of the timer being replaced
        #[arg(long, requires = "activity")]
        log_previous: bool,
        /// Activity for the replaced timer's time entry
        #[arg(long)]
        activity: Option<String>,
        /// Comment for the replaced timer's time entry
        #[arg(short = 'm', long)]
        comment: Option<String>,
    },

    /// Stop the timer and optionally log the time
    Stop {
        /// Description of the work done
        #[arg(short = 'm', long)]
        comment: Option<String>,
        /// Activity name for the time entry
        #[arg(long)]
        activity: Option<String>,
        /// Log without asking
        #[arg(short, long, conflicts_with = "no_log")]
        yes: bool,
        /// Stop without logging
        #[arg(long)]
        no_log: bool,
    },

    /// Show the running timer
    TimerStatus,

    /// Create daily tasks for a team
    Daily {
        /// Project where the tasks are created
        #[arg(long)]
        project_id: i64,
        /// Team name
        #[arg(long)]
        team: String,
        /// First day, DD-MM-YYYY [default: today]
        #[arg(long, value_parser = commands::daily::parse_date)]
        start_date: Option<NaiveDate>,
        /// Last day, DD-MM-YYYY [default: start date]
        #[arg(long, value_parser = commands::daily::parse_date)]
        end_date: Option<NaiveDate>,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,redminecli=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn connect(dir: &Path) -> Result<RedmineClient> {
    let config = config::load(dir)?;
    RedmineClient::new(&config).context("Failed to set up the Redmine client")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let dir = match cli.config_dir {
        Some(dir) => dir,
        None => config::default_config_dir()?,
    };
    let mut input = io::stdin().lock();
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Config { url, key } => {
            commands::credentials::configure(&dir, url, key, &mut input, &mut out)
        }

        Commands::Credentials => commands::credentials::show(&dir, &mut out),

        Commands::Tasks { status } => {
            let client = connect(&dir)?;
            commands::tasks::run(
                &client,
                status.as_deref(),
                commands::tasks::color_enabled(),
                &mut out,
            )
        }

        Commands::Log {
            issue_id,
            hours,
            activity,
            comment,
        } => {
            let client = connect(&dir)?;
            commands::log::run(&client, issue_id, hours, &activity, &comment, &mut out)
        }

        Commands::TimeEntries { issue_id, limit } => {
            let client = connect(&dir)?;
            commands::entries::run(&client, issue_id, limit, &mut out)
        }

        Commands::Activities => {
            let client = connect(&dir)?;
            commands::catalog::activities(&client, &mut out)
        }

        Commands::Projects => {
            let client = connect(&dir)?;
            commands::catalog::projects(&client, &mut out)
        }

        Commands::Start {
            issue_id,
            log_previous,
            activity,
            comment,
        } => {
            let client = connect(&dir)?;
            let store = FileSessionStore::in_dir(&dir);
            let timer = TimerManager::new(&store, &client, &SystemClock);
            let prior = if log_previous {
                PriorTimer::Log(LogRequest {
                    activity: activity.unwrap_or_default(),
                    comment: comment.unwrap_or_default(),
                })
            } else {
                PriorTimer::Discard
            };
            commands::timer::start(&timer, issue_id, prior, &mut out)
        }

        Commands::Stop {
            comment,
            activity,
            yes,
            no_log,
        } => {
            let client = connect(&dir)?;
            let store = FileSessionStore::in_dir(&dir);
            let timer = TimerManager::new(&store, &client, &SystemClock);
            let options = commands::timer::StopOptions {
                log: match (yes, no_log) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                activity,
                comment,
            };
            commands::timer::stop(&timer, options, &mut input, &mut out)
        }

        Commands::TimerStatus => {
            let client = connect(&dir)?;
            let store = FileSessionStore::in_dir(&dir);
            let timer = TimerManager::new(&store, &client, &SystemClock);
            commands::timer::status(&timer, &SystemClock, &mut out)
        }

        Commands::Daily {
            project_id,
            team,
            start_date,
            end_date,
        } => {
            let client = connect(&dir)?;
            let start = start_date.unwrap_or_else(|| Local::now().date_naive());
            commands::daily::run(&client, project_id, &team, start, end_date, &mut out)
        }
    }
}
