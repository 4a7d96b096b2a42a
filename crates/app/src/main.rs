use std::fmt;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use log::{info, warn};
use quiz_core::model::QuizMeta;
use services::{
    Advance, AnswerOutcome, Clock, OptionState, QuizBundle, QuizGateway, QuizLoopService,
    QuizSession, RemoteQuizStore, RemoteStoreConfig,
};
use storage::repository::{QuizRepository, Storage};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidRemoteUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidRemoteUrl { raw } => write!(f, "invalid --remote value: {raw}"),
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
    eprintln!("  cargo run -p app -- play     [--db <sqlite_url>] [--remote <url>] [--shuffle-options]");
    eprintln!("  cargo run -p app -- overview [--db <sqlite_url>] [--remote <url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://quiz.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_REMOTE_URL, QUIZ_REMOTE_TOKEN, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Overview,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "overview" => Some(Self::Overview),
            _ => None,
        }
    }
}

/// Where quiz documents are read from.
enum Source {
    Sqlite(String),
    Remote(RemoteStoreConfig),
}

struct Args {
    source: Source,
    shuffle_options: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);
        let mut remote = RemoteStoreConfig::from_env();
        let mut shuffle_options = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                    remote = None;
                }
                "--remote" => {
                    let value = require_value(args, "--remote")?;
                    if !(value.starts_with("http://") || value.starts_with("https://")) {
                        return Err(ArgsError::InvalidRemoteUrl { raw: value });
                    }
                    let config = match remote.and_then(|r| r.token) {
                        Some(token) => RemoteStoreConfig::new(value).with_token(token),
                        None => RemoteStoreConfig::new(value),
                    };
                    remote = Some(config);
                }
                "--shuffle-options" => shuffle_options = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let source = match remote {
            Some(config) => Source::Remote(config),
            None => Source::Sqlite(db_url),
        };
        Ok(Self {
            source,
            shuffle_options,
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

async fn open_store(source: Source) -> Result<Arc<dyn QuizRepository>, Box<dyn std::error::Error>> {
    match source {
        Source::Sqlite(db_url) => {
            prepare_sqlite_file(&db_url)?;
            info!("reading quiz from {db_url}");
            Ok(Storage::sqlite(&db_url).await?.quizzes)
        }
        Source::Remote(config) => {
            info!("reading quiz from {}", config.base_url);
            Ok(Arc::new(RemoteQuizStore::new(config)))
        }
    }
}

fn print_overview(bundle: &QuizBundle) {
    let overview = bundle.overview();
    println!("{}", overview.title);
    println!("  questions: {}", overview.question_count);
    println!("  attended:  {}", overview.people_attended);
    if !overview.rules.is_empty() {
        println!();
        println!("Rules");
        for rule in &overview.rules {
            println!("  - {rule}");
        }
    }
}

fn read_line(input: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn print_question(session: &QuizSession) {
    let progress = session.progress();
    println!();
    println!(
        "Question {}/{} [{:>3.0}%]",
        progress.position,
        progress.total,
        progress.fraction * 100.0
    );
    println!("{}", session.current_question().prompt());
    for (i, (option, state)) in session.option_states().into_iter().enumerate() {
        let marker = match state {
            OptionState::Neutral => " ",
            OptionState::Correct => "+",
            OptionState::Incorrect => "x",
        };
        println!("  {marker} {}. {option}", i + 1);
    }
}

/// Walks the session until it is finished or the input asks to quit.
///
/// Returns `true` when the session reached the finish step.
fn drive(session: &mut QuizSession, input: &mut impl BufRead) -> io::Result<bool> {
    loop {
        print_question(session);
        print!("answer (1-{}, q to quit): ", session.current_question().options().len());
        io::stdout().flush()?;

        let Some(line) = read_line(input)? else {
            return Ok(false);
        };
        if line.eq_ignore_ascii_case("q") {
            return Ok(false);
        }
        let Some(option) = line
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| session.current_question().options().get(i).cloned())
        else {
            println!("not an option: {line}");
            continue;
        };

        match session.select_answer(&option) {
            Ok(AnswerOutcome::Correct) => println!("correct"),
            Ok(AnswerOutcome::Incorrect) => println!(
                "wrong, the answer was {:?}",
                session.current_question().correct_answer()
            ),
            Ok(AnswerOutcome::AlreadyAnswered) => {}
            Err(err) => {
                println!("{err}");
                continue;
            }
        }

        match session.advance() {
            Ok(Advance::Next { .. }) => {}
            Ok(Advance::ReadyToFinish) => return Ok(true),
            Err(err) => println!("{err}"),
        }
    }
}

async fn play(
    svc: &QuizLoopService,
    mut bundle: QuizBundle,
) -> Result<(), Box<dyn std::error::Error>> {
    print_overview(&bundle);
    let mut session = svc.start_session(&bundle)?;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    if !drive(&mut session, &mut input)? {
        svc.abandon(session)?;
        println!("quiz abandoned");
        return Ok(());
    }

    let finished = svc.finish(&mut session, &mut bundle.meta)?;
    println!();
    println!("Results");
    println!(
        "  {}/{} correct, {}",
        finished.score_card.score(),
        finished.score_card.total(),
        finished.score_card.percent_label()
    );
    report_attendance(&bundle.meta);

    if let Err(err) = finished.commit.await {
        warn!("attendance task did not complete: {err}");
    }
    Ok(())
}

fn report_attendance(meta: &QuizMeta) {
    println!("  {} people have taken this quiz", meta.people_attended());
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            io::Error::new(io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let store = open_store(parsed.source).await?;
    let svc = QuizLoopService::new(Clock::system(), QuizGateway::on_current_runtime(store))
        .with_shuffle_options(parsed.shuffle_options);
    let bundle = svc.load_quiz().await?;

    match cmd {
        Command::Overview => {
            print_overview(&bundle);
            Ok(())
        }
        Command::Play => play(&svc, bundle).await,
    }
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
