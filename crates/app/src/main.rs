use std::fmt;
use std::path::PathBuf;

use services::{RemoteConfig, SessionStore};
use study_core::Clock;
use study_core::model::{Credentials, PRESET_SUBJECTS, QuizId};

mod commands;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { what: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidQuizId { raw: String },
    MissingCredentials,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { what } => write!(f, "missing {what}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidQuizId { raw } => write!(f, "invalid quiz id: {raw}"),
            ArgsError::MissingCredentials => {
                write!(f, "credentials required (--user/--password or STUDY_USER/STUDY_PASSWORD)")
            }
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
    eprintln!("  study [--api <url>] [--user <name>] [--password <pw>] <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  quiz <file>                 generate a quiz from a document and take it");
    eprintln!("  review <quiz-id>            take a stored quiz again");
    eprintln!("  doubt [--subject <s>]... [--pdf <file>] [--image <file>]");
    eprintln!("                              ask a question and follow up; /new starts over");
    eprintln!("  history [--subject <s>]     show profile, quiz and doubt history");
    eprintln!();
    eprintln!("Subjects: {} or any custom tag", PRESET_SUBJECTS.join(", "));
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STUDY_API_BASE_URL, STUDY_HTTP_TIMEOUT_SECS, STUDY_QUESTIONS_PER_SECTION,");
    eprintln!("  STUDY_USER, STUDY_PASSWORD, STUDY_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Quiz { file: PathBuf },
    Review { quiz_id: QuizId },
    Doubt(commands::DoubtOptions),
    History { subject: Option<String> },
}

#[derive(Debug)]
struct Args {
    api: Option<String>,
    user: Option<String>,
    password: Option<String>,
    command: Command,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut api = None;
        let mut user = std::env::var("STUDY_USER").ok();
        let mut password = std::env::var("STUDY_PASSWORD").ok();

        let name = loop {
            let Some(arg) = args.next() else {
                return Err(ArgsError::MissingArgument { what: "command" });
            };
            match arg.as_str() {
                "--api" => api = Some(require_value(args, "--api")?),
                "--user" => user = Some(require_value(args, "--user")?),
                "--password" => password = Some(require_value(args, "--password")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => break arg,
            }
        };

        let command = match name.as_str() {
            "quiz" => {
                let file = args
                    .next()
                    .ok_or(ArgsError::MissingArgument { what: "document path" })?;
                reject_extra(args)?;
                Command::Quiz {
                    file: PathBuf::from(file),
                }
            }
            "review" => {
                let raw = args
                    .next()
                    .ok_or(ArgsError::MissingArgument { what: "quiz id" })?;
                let quiz_id = raw
                    .parse()
                    .map_err(|_| ArgsError::InvalidQuizId { raw: raw.clone() })?;
                reject_extra(args)?;
                Command::Review { quiz_id }
            }
            "doubt" => Command::Doubt(parse_doubt(args)?),
            "history" => {
                let mut subject = None;
                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "--subject" => subject = Some(require_value(args, "--subject")?),
                        _ => return Err(ArgsError::UnknownArg(arg)),
                    }
                }
                Command::History { subject }
            }
            _ => return Err(ArgsError::UnknownCommand(name)),
        };

        Ok(Self {
            api,
            user,
            password,
            command,
        })
    }

    fn credentials(&self) -> Result<Credentials, Box<dyn std::error::Error>> {
        match (&self.user, &self.password) {
            (Some(user), Some(password)) => Ok(Credentials::new(user.as_str(), password.as_str())?),
            _ => Err(ArgsError::MissingCredentials.into()),
        }
    }
}

fn parse_doubt(
    args: &mut impl Iterator<Item = String>,
) -> Result<commands::DoubtOptions, ArgsError> {
    let mut options = commands::DoubtOptions::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--subject" => options.subjects.push(require_value(args, "--subject")?),
            "--pdf" => options.pdf = Some(PathBuf::from(require_value(args, "--pdf")?)),
            "--image" => options.image = Some(PathBuf::from(require_value(args, "--image")?)),
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }
    Ok(options)
}

fn reject_extra(args: &mut impl Iterator<Item = String>) -> Result<(), ArgsError> {
    match args.next() {
        Some(arg) => Err(ArgsError::UnknownArg(arg)),
        None => Ok(()),
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let mut config = RemoteConfig::from_env()?;
    if let Some(api) = &parsed.api {
        let questions_per_section = config.questions_per_section;
        let timeout = config.timeout;
        config = RemoteConfig::with_base_url(api)?.with_questions_per_section(questions_per_section);
        config.timeout = timeout;
    }
    tracing::debug!(base_url = %config.base_url, "using backend");

    let store = SessionStore::from_config(&config, Clock::default())?;
    store.login(&parsed.credentials()?).await?;

    match parsed.command {
        Command::Quiz { file } => commands::take_generated_quiz(&store, &file).await,
        Command::Review { quiz_id } => commands::review_quiz(&store, quiz_id).await,
        Command::Doubt(options) => commands::doubt_session(&store, options).await,
        Command::History { subject } => commands::show_history(&store, subject.as_deref()).await,
    }
}

#[tokio::main]
async fn main() {
    services::logging::init_tracing();
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
        Args::parse(&mut iter)
    }

    #[test]
    fn global_flags_precede_the_command() {
        let args = parse(&["--api", "http://localhost:9000", "--user", "ada", "review", "12"])
            .unwrap();
        assert_eq!(args.api.as_deref(), Some("http://localhost:9000"));
        assert_eq!(args.user.as_deref(), Some("ada"));
        assert_eq!(
            args.command,
            Command::Review {
                quiz_id: QuizId::new(12)
            }
        );
    }

    #[test]
    fn doubt_collects_subjects_and_attachments() {
        let args = parse(&[
            "doubt",
            "--subject",
            "Physics",
            "--subject",
            "Optics",
            "--pdf",
            "notes.pdf",
        ])
        .unwrap();
        let Command::Doubt(options) = args.command else {
            panic!("expected doubt command");
        };
        assert_eq!(options.subjects, vec!["Physics", "Optics"]);
        assert_eq!(options.pdf, Some(PathBuf::from("notes.pdf")));
        assert_eq!(options.image, None);
    }

    #[test]
    fn bad_input_is_reported() {
        assert!(matches!(
            parse(&["review", "abc"]),
            Err(ArgsError::InvalidQuizId { .. })
        ));
        assert!(matches!(
            parse(&["quiz"]),
            Err(ArgsError::MissingArgument { .. })
        ));
        assert!(matches!(
            parse(&["--api"]),
            Err(ArgsError::MissingValue { flag: "--api" })
        ));
        assert!(matches!(
            parse(&["grade"]),
            Err(ArgsError::UnknownCommand(_))
        ));
    }
}
