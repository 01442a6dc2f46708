use chrono::DateTime;
use clap::Parser;
use git_versioner::error::AppResult;
use git_versioner::{Config, GitFacts, GitInfoExtractor};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "git-versioner")]
#[command(version, about = "Print the git facts a build version is derived from")]
struct Cli {
    /// Project directory
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// Config file (default: git-versioner.toml in the project directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print JSON instead of plain text
    #[arg(long)]
    json: bool,

    /// Also report commit count and date of a revision (repeatable)
    #[arg(long = "rev", value_name = "REV")]
    revs: Vec<String>,

    /// Log every git command
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct Report {
    #[serde(flatten)]
    facts: GitFacts,
    revisions: Vec<RevisionReport>,
}

#[derive(Serialize)]
struct RevisionReport {
    rev: String,
    commit_count: usize,
    date: i64,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> AppResult<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::discover(&cli.dir)?,
    };

    let mut extractor = GitInfoExtractor::with_config(&cli.dir, &config);
    let facts = extractor.facts()?;

    let mut revisions = Vec::with_capacity(cli.revs.len());
    for rev in &cli.revs {
        revisions.push(RevisionReport {
            rev: rev.clone(),
            commit_count: extractor.commits_up_to(rev, &[])?.len(),
            date: extractor.commit_date(rev)?,
        });
    }

    let report = Report { facts, revisions };
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &Report) {
    let facts = &report.facts;

    println!("repository:     {}", facts.readiness);
    println!("sha1:           {}", facts.sha1.as_deref().unwrap_or("-"));
    println!(
        "branch:         {}",
        facts.branch.as_deref().unwrap_or("(detached)")
    );
    println!("commits:        {}", facts.commit_count);
    println!("initial commit: {}", format_date(facts.initial_commit_date));
    println!("local changes:  {}", facts.local_changes);

    for rev in &report.revisions {
        println!(
            "{}: {} commits, {}",
            rev.rev,
            rev.commit_count,
            format_date(rev.date)
        );
    }
}

fn format_date(seconds: i64) -> String {
    if seconds == 0 {
        return "-".to_string();
    }

    DateTime::from_timestamp(seconds, 0)
        .map(|date| date.to_rfc3339())
        .unwrap_or_else(|| seconds.to_string())
}
