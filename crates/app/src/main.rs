use std::fmt;
use std::sync::Arc;

use gym_core::catalog::builtin_questions;
use gym_core::model::{
    Category, ConfidenceRating, QualityRating, QuestionId, SelfAssessment, SessionId, UserId,
};
use services::{
    BackendClient, BackendConfig, BackendError, Clock, DEFAULT_WEEKLY_GOAL, PracticeCalendar,
    PracticeService, ProgressService, sync_sessions,
};
use storage::repository::{QuestionRepository, Storage};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidUserId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidUtcOffset { raw: String },
    InvalidWeeklyGoal { raw: String },
    InvalidRating { flag: &'static str, raw: String },
    InvalidDuration { raw: String },
    InvalidEnv { var: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required for this command"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user value: {raw:?}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidUtcOffset { raw } => {
                write!(f, "invalid --utc-offset value (minutes east of UTC): {raw}")
            }
            ArgsError::InvalidWeeklyGoal { raw } => write!(f, "invalid --weekly-goal value: {raw}"),
            ArgsError::InvalidRating { flag, raw } => {
                write!(f, "invalid {flag} value (expected 1-5): {raw}")
            }
            ArgsError::InvalidDuration { raw } => write!(f, "invalid --duration value: {raw}"),
            ArgsError::InvalidEnv { var, raw } => write!(f, "invalid {var} value: {raw:?}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- report [--db <sqlite_url>] [--user <id>] [--utc-offset <min>] [--weekly-goal <n>]");
    eprintln!("  cargo run -p app -- sync   [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- start  [--user <id>] [--question <id> | --category <label>]");
    eprintln!("  cargo run -p app -- assess --session <id> --confidence <1-5> [--quality <1-5>] [--notes <text>] [--duration <secs>]");
    eprintln!("  cargo run -p app -- search [--user <id>] [--term <text>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:dev.sqlite3");
    eprintln!("  --user user1");
    eprintln!("  --utc-offset <local time zone>");
    eprintln!("  --weekly-goal {DEFAULT_WEEKLY_GOAL}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  GYM_DB_URL, GYM_USER_ID, GYM_UTC_OFFSET, GYM_WEEKLY_GOAL");
    eprintln!("  GYM_API_BASE_URL, GYM_API_TOKEN (sync only)");
    eprintln!("  RUST_LOG (default: app=info,services=info)");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Report,
    Sync,
    Start,
    Assess,
    Search,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "report" => Some(Self::Report),
            "sync" => Some(Self::Sync),
            "start" => Some(Self::Start),
            "assess" => Some(Self::Assess),
            "search" => Some(Self::Search),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user_id: UserId,
    calendar: PracticeCalendar,
    weekly_goal: u32,
    question: Option<QuestionId>,
    category: Option<Category>,
    session: Option<SessionId>,
    confidence: Option<ConfidenceRating>,
    quality: Option<QualityRating>,
    notes: Option<String>,
    duration_secs: u32,
    term: String,
}

fn parse_offset(raw: &str) -> Option<PracticeCalendar> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .and_then(PracticeCalendar::from_offset_minutes)
}

fn parse_rating(raw: &str) -> Option<u8> {
    raw.trim().parse::<u8>().ok()
}

/// Settings that flags may override, before any flag is read.
#[derive(Debug, Clone)]
struct Defaults {
    db_url: String,
    user_id: UserId,
    calendar: PracticeCalendar,
    weekly_goal: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            db_url: "sqlite://dev.sqlite3".into(),
            user_id: UserId::new("user1"),
            calendar: PracticeCalendar::Local,
            weekly_goal: DEFAULT_WEEKLY_GOAL,
        }
    }
}

fn env_value(var: &'static str) -> Option<String> {
    std::env::var(var).ok()
}

impl Defaults {
    /// Apply `GYM_*` variables over the built-in defaults. A variable that is
    /// set but unusable is an error, same as the matching flag.
    fn from_env() -> Result<Self, ArgsError> {
        Self::default().with_vars(env_value)
    }

    fn with_vars(
        mut self,
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let invalid = |var: &'static str, raw: String| ArgsError::InvalidEnv { var, raw };

        if let Some(raw) = lookup("GYM_DB_URL") {
            if raw.trim().is_empty() {
                return Err(invalid("GYM_DB_URL", raw));
            }
            self.db_url = normalize_sqlite_url(raw);
        }
        if let Some(raw) = lookup("GYM_USER_ID") {
            self.user_id = raw.parse().map_err(|_| invalid("GYM_USER_ID", raw.clone()))?;
        }
        if let Some(raw) = lookup("GYM_UTC_OFFSET") {
            self.calendar =
                parse_offset(&raw).ok_or_else(|| invalid("GYM_UTC_OFFSET", raw.clone()))?;
        }
        if let Some(raw) = lookup("GYM_WEEKLY_GOAL") {
            self.weekly_goal = raw
                .trim()
                .parse()
                .map_err(|_| invalid("GYM_WEEKLY_GOAL", raw.clone()))?;
        }
        Ok(self)
    }
}

impl Args {
    fn parse(
        args: &mut impl Iterator<Item = String>,
        defaults: Defaults,
    ) -> Result<Self, ArgsError> {
        let Defaults {
            mut db_url,
            mut user_id,
            mut calendar,
            mut weekly_goal,
        } = defaults;

        let mut question = None;
        let mut category = None;
        let mut session = None;
        let mut confidence = None;
        let mut quality = None;
        let mut notes = None;
        let mut duration_secs = 0;
        let mut term = String::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--user" => {
                    let value = require_value(args, "--user")?;
                    user_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?;
                }
                "--utc-offset" => {
                    let value = require_value(args, "--utc-offset")?;
                    calendar = parse_offset(&value)
                        .ok_or_else(|| ArgsError::InvalidUtcOffset { raw: value.clone() })?;
                }
                "--weekly-goal" => {
                    let value = require_value(args, "--weekly-goal")?;
                    weekly_goal = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidWeeklyGoal { raw: value.clone() })?;
                }
                "--question" => {
                    let value = require_value(args, "--question")?;
                    question = Some(QuestionId::new(value.trim()));
                }
                "--category" => {
                    category = Some(Category::from_label(&require_value(args, "--category")?));
                }
                "--session" => {
                    let value = require_value(args, "--session")?;
                    session = Some(SessionId::new(value.trim()));
                }
                "--confidence" => {
                    let value = require_value(args, "--confidence")?;
                    let rating = parse_rating(&value)
                        .and_then(|v| ConfidenceRating::new(v).ok())
                        .ok_or_else(|| ArgsError::InvalidRating {
                            flag: "--confidence",
                            raw: value.clone(),
                        })?;
                    confidence = Some(rating);
                }
                "--quality" => {
                    let value = require_value(args, "--quality")?;
                    let rating = parse_rating(&value)
                        .and_then(|v| QualityRating::new(v).ok())
                        .ok_or_else(|| ArgsError::InvalidRating {
                            flag: "--quality",
                            raw: value.clone(),
                        })?;
                    quality = Some(rating);
                }
                "--notes" => {
                    notes = Some(require_value(args, "--notes")?);
                }
                "--duration" => {
                    let value = require_value(args, "--duration")?;
                    duration_secs = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidDuration { raw: value.clone() })?;
                }
                "--term" => {
                    term = require_value(args, "--term")?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user_id,
            calendar,
            weekly_goal,
            question,
            category,
            session,
            confidence,
            quality,
            notes,
            duration_secs,
            term,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "app=info,services=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand means "report".
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Report,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Report,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let args = Defaults::from_env()
        .and_then(|defaults| Args::parse(&mut iter, defaults))
        .map_err(|e| {
            eprintln!("{e}");
            print_usage();
            e
        })?;

    prepare_sqlite_file(&args.db_url)?;
    let storage = Storage::sqlite(&args.db_url).await?;
    let clock = Clock::default_clock();

    match cmd {
        Command::Report => {
            ensure_question_bank(storage.questions.as_ref()).await?;
            let progress = ProgressService::new(
                clock,
                args.calendar,
                Arc::clone(&storage.questions),
                Arc::clone(&storage.sessions),
            )
            .with_weekly_goal(args.weekly_goal);
            let report = progress.dashboard(&args.user_id).await?;
            info!(
                user = %args.user_id,
                current_streak = report.streak.current_streak,
                sessions = report.overview.total_sessions,
                "report generated"
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Sync => {
            let config = BackendConfig::from_env()?.ok_or(BackendError::Disabled)?;
            let client = BackendClient::new(Some(config));
            let report = sync_sessions(&client, storage.sessions.as_ref()).await?;
            println!(
                "Synced {} sessions into {} ({} conflicting, {} malformed skipped)",
                report.stored, args.db_url, report.conflicts, report.malformed
            );
        }
        Command::Start => {
            ensure_question_bank(storage.questions.as_ref()).await?;
            let practice = PracticeService::new(
                clock,
                Arc::clone(&storage.questions),
                Arc::clone(&storage.sessions),
            );
            let question_id = match args.question {
                Some(id) => id,
                None => practice
                    .random_question(args.category.as_ref())
                    .await?
                    .id()
                    .clone(),
            };
            let session = practice.start_session(&args.user_id, &question_id).await?;
            println!("{}", serde_json::to_string_pretty(&session)?);
        }
        Command::Assess => {
            let session_id = args.session.ok_or(ArgsError::MissingFlag { flag: "--session" })?;
            let confidence = args.confidence.ok_or(ArgsError::MissingFlag {
                flag: "--confidence",
            })?;
            let mut assessment = SelfAssessment::new(confidence);
            if let Some(quality) = args.quality {
                assessment = assessment.with_quality(quality);
            }
            if let Some(notes) = args.notes {
                assessment = assessment.with_notes(notes);
            }

            let practice = PracticeService::new(
                clock,
                Arc::clone(&storage.questions),
                Arc::clone(&storage.sessions),
            );
            let session = practice
                .submit_assessment(&session_id, assessment, args.duration_secs)
                .await?;
            println!("{}", serde_json::to_string_pretty(&session)?);
        }
        Command::Search => {
            let practice = PracticeService::new(
                clock,
                Arc::clone(&storage.questions),
                Arc::clone(&storage.sessions),
            );
            let hits = practice.search_sessions(&args.user_id, &args.term).await?;
            for hit in &hits {
                println!(
                    "{}\t{}\t{}\t{}",
                    hit.session.id(),
                    hit.session.created_at().to_rfc3339(),
                    hit.question.category(),
                    hit.question.text()
                );
            }
            info!(matches = hits.len(), term = %args.term, "search finished");
        }
    }

    Ok(())
}

/// Load the built-in questions into an empty bank.
async fn ensure_question_bank(
    questions: &dyn QuestionRepository,
) -> Result<(), Box<dyn std::error::Error>> {
    if !questions.list_questions().await?.is_empty() {
        return Ok(());
    }

    let builtin = builtin_questions();
    for question in &builtin {
        questions.upsert_question(question).await?;
    }
    info!(count = builtin.len(), "loaded built-in question bank");
    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|s| (*s).to_string());
        Args::parse(&mut iter, Defaults::default())
    }

    fn vars(
        pairs: Vec<(&'static str, &'static str)>,
    ) -> impl Fn(&'static str) -> Option<String> {
        move |var| {
            pairs
                .iter()
                .find(|(name, _)| *name == var)
                .map(|(_, value)| (*value).to_string())
        }
    }

    #[test]
    fn parses_assessment_flags() {
        let args = parse(&[
            "--session",
            "abc",
            "--confidence",
            "4",
            "--quality",
            "5",
            "--duration",
            "95",
            "--utc-offset",
            "-300",
        ])
        .unwrap();
        assert_eq!(args.session, Some(SessionId::new("abc")));
        assert_eq!(args.confidence.map(ConfidenceRating::value), Some(4));
        assert_eq!(args.duration_secs, 95);
        assert_eq!(args.calendar, PracticeCalendar::from_offset_minutes(-300).unwrap());
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            parse(&["--confidence", "6"]),
            Err(ArgsError::InvalidRating { .. })
        ));
        assert!(matches!(
            parse(&["--utc-offset", "2000"]),
            Err(ArgsError::InvalidUtcOffset { .. })
        ));
        assert!(matches!(
            parse(&["--weekly-goal"]),
            Err(ArgsError::MissingValue { .. })
        ));
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:dev.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("dev.sqlite3"));
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
    }

    #[test]
    fn flags_override_environment_defaults() {
        let defaults = Defaults::default()
            .with_vars(vars(vec![("GYM_USER_ID", "user7"), ("GYM_WEEKLY_GOAL", "3")]))
            .unwrap();
        assert_eq!(defaults.user_id, UserId::new("user7"));

        let mut iter = ["--weekly-goal", "9"].iter().map(|s| (*s).to_string());
        let args = Args::parse(&mut iter, defaults).unwrap();
        assert_eq!(args.user_id, UserId::new("user7"));
        assert_eq!(args.weekly_goal, 9);
        assert_eq!(args.calendar, PracticeCalendar::Local);
    }

    #[test]
    fn unusable_environment_values_are_rejected() {
        for (var, raw) in [
            ("GYM_UTC_OFFSET", "east"),
            ("GYM_USER_ID", "  "),
            ("GYM_WEEKLY_GOAL", "five"),
            ("GYM_DB_URL", ""),
        ] {
            let err = Defaults::default()
                .with_vars(vars(vec![(var, raw)]))
                .unwrap_err();
            assert!(
                matches!(err, ArgsError::InvalidEnv { var: got, .. } if got == var),
                "{var}: {err}"
            );
        }
    }
}
