use std::fmt;

use quiz_core::model::{Question, QuestionDraft, QuestionId, QuizMeta};
use storage::repository::{QuestionRecord, QuizInfoRecord, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    title: String,
    people_attended: u32,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidAttended { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidAttended { raw } => write!(f, "invalid --attended value: {raw}"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite:quiz.sqlite3?mode=rwc".into());
        let mut title = std::env::var("QUIZ_TITLE").unwrap_or_else(|_| "Rust Basics".into());
        let mut people_attended = 0;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--title" => {
                    title = require_value(&mut args, "--title")?;
                }
                "--attended" => {
                    let value = require_value(&mut args, "--attended")?;
                    people_attended = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidAttended { raw: value.clone() })?;
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
            title,
            people_attended,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>    SQLite URL (default: sqlite:quiz.sqlite3?mode=rwc)");
    eprintln!("  --title <text>       Quiz title (default: Rust Basics)");
    eprintln!("  --attended <n>       Initial attendance counter (default: 0)");
    eprintln!("  -h, --help           Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  QUIZ_DB_URL, QUIZ_TITLE");
}

fn sample_quiz(args: &Args) -> Result<(QuizMeta, Vec<Question>), quiz_core::Error> {
    let meta = QuizMeta::new(
        args.title.clone(),
        args.people_attended,
        vec![
            "Each question has exactly one correct answer.".into(),
            "An answer cannot be changed once selected.".into(),
            "Your score is shown when you finish.".into(),
        ],
    )?;

    let samples = [
        (
            "Which keyword declares an immutable binding?",
            &["let", "mut", "const fn", "static mut"][..],
            "let",
        ),
        (
            "What does the `?` operator do on an `Err` value?",
            &["Panics", "Returns it early", "Ignores it"][..],
            "Returns it early",
        ),
        (
            "Which type owns a heap-allocated UTF-8 string?",
            &["&str", "String", "char"][..],
            "String",
        ),
        (
            "Which trait enables `{:?}` formatting?",
            &["Display", "Debug", "Clone", "Default"][..],
            "Debug",
        ),
    ];

    let mut questions = Vec::with_capacity(samples.len());
    for (prompt, options, answer) in samples {
        let question = QuestionDraft::new(prompt, options.iter().copied(), answer)
            .validate(QuestionId::random())?;
        questions.push(question);
    }
    Ok((meta, questions))
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let (meta, questions) = sample_quiz(&args)?;

    storage
        .admin
        .upsert_quiz_info(&QuizInfoRecord::from_meta(&meta))
        .await?;
    for (position, question) in (0_u32..).zip(&questions) {
        storage
            .admin
            .upsert_question(&QuestionRecord::from_question(question, position))
            .await?;
    }

    println!(
        "Seeded quiz {:?} with {} questions into {}",
        meta.title(),
        questions.len(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
