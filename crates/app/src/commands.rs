use std::error::Error;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use services::{
    AccountError, AttemptMetadata, DoubtError, HistoryService, NavigationIntent, QuizEngine,
    QuizError, SessionStore,
};
use study_core::model::{FileUpload, OptionKey, PRESET_SUBJECTS, PageRequest, QuizId};

type CommandResult = Result<(), Box<dyn Error>>;
type Input = Lines<BufReader<Stdin>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoubtOptions {
    pub subjects: Vec<String>,
    pub pdf: Option<PathBuf>,
    pub image: Option<PathBuf>,
}

fn stdin_lines() -> Input {
    BufReader::new(tokio::io::stdin()).lines()
}

async fn read_upload(path: &Path) -> Result<FileUpload, Box<dyn Error>> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
    Ok(FileUpload::new(file_name, mime_for(path), bytes))
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Match a tag against the preset subjects, ignoring case.
fn preset_spelling(tag: &str) -> &str {
    PRESET_SUBJECTS
        .iter()
        .find(|preset| preset.eq_ignore_ascii_case(tag.trim()))
        .copied()
        .unwrap_or(tag)
}

fn login_hint(intent: Option<NavigationIntent>) {
    if intent == Some(NavigationIntent::ShowLogin) {
        eprintln!("Your session has ended. Sign in again to continue.");
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

pub async fn take_generated_quiz(store: &SessionStore, file: &Path) -> CommandResult {
    let upload = read_upload(file).await?;
    let quiz = store.quiz();
    let loader = store.loader();
    println!(
        "Generating {} questions per section from {} ...",
        loader.questions_per_section(),
        upload.file_name
    );
    if let Err(err) = loader.load_generated(&quiz, &upload).await {
        login_hint(err.navigation_intent());
        return Err(err.into());
    }
    if let Some(warning) = quiz.snapshot().warning {
        println!("Note: {warning}");
    }
    take_quiz(&quiz).await
}

pub async fn review_quiz(store: &SessionStore, quiz_id: QuizId) -> CommandResult {
    let quiz = store.quiz();
    if let Err(err) = store.loader().load_by_id(&quiz, quiz_id).await {
        login_hint(err.navigation_intent());
        return Err(err.into());
    }
    take_quiz(&quiz).await
}

async fn take_quiz(quiz: &QuizEngine) -> CommandResult {
    let Some(attempt) = quiz.snapshot().attempt else {
        return Err(QuizError::NotLoaded.into());
    };
    if let Some(title) = attempt.quiz().title() {
        println!("\n{title}");
    }
    if attempt.total_questions() == 0 {
        println!("This quiz has no questions.");
        return Ok(());
    }

    let mut input = stdin_lines();
    for section in attempt.quiz().sections() {
        println!("\nSection {}", section.id().index() + 1);
        for question in section.questions() {
            println!("\n{}", question.prompt());
            for (key, text) in question.options() {
                println!("  {}) {text}", key.index() + 1);
            }
            let option = loop {
                print_prompt("Answer [1-4]: ");
                let Some(line) = input.next_line().await? else {
                    println!("\nQuiz left unfinished.");
                    return Ok(());
                };
                match line.trim().parse::<usize>() {
                    Ok(n @ 1..=4) => break OptionKey::ALL[n - 1],
                    _ => println!("Please enter a number from 1 to 4."),
                }
            };
            quiz.select_answer(question.section_id(), question.question_id(), option)?;
            if question.is_correct(option) {
                println!("Correct.");
            } else {
                println!(
                    "Incorrect. The answer is {}) {}.",
                    question.correct_option().index() + 1,
                    question.option(question.correct_option())
                );
            }
            if !question.explanation().is_empty() {
                println!("{}", question.explanation());
            }
        }
    }

    if let Some(report) = quiz.score_report() {
        let percentage = report.percentage_label().unwrap_or_else(|| "-".into());
        println!("\nScore: {}/{} ({percentage})", report.score, report.total);
    }

    match quiz.submit(AttemptMetadata::default()).await {
        Ok(ack) => {
            println!("{}", ack.message.as_deref().unwrap_or("Attempt saved."));
            Ok(())
        }
        Err(err) => {
            login_hint(err.navigation_intent());
            Err(err.into())
        }
    }
}

//
// ─── DOUBT ─────────────────────────────────────────────────────────────────────
//

pub async fn doubt_session(store: &SessionStore, options: DoubtOptions) -> CommandResult {
    let doubt = store.doubt();
    for subject in &options.subjects {
        doubt.add_custom_subject(preset_spelling(subject))?;
    }
    if let Some(path) = &options.pdf {
        doubt.attach_pdf(read_upload(path).await?)?;
    }
    if let Some(path) = &options.image {
        doubt.attach_image(read_upload(path).await?)?;
    }

    println!("Ask your question. Follow up as often as you like; /new starts over, an empty line quits.");
    let mut input = stdin_lines();
    loop {
        print_prompt("> ");
        let Some(line) = input.next_line().await? else {
            return Ok(());
        };
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        if line == "/new" {
            store.new_chat();
            println!("Started a new conversation.");
            continue;
        }

        let started = !doubt.snapshot().conversation.is_empty();
        let result = if started {
            doubt.clarify(line).await
        } else {
            doubt.ask_first(line).await
        };
        match result {
            Ok(answer) => println!("\n{answer}\n"),
            Err(err) => {
                eprintln!("{err}");
                login_hint(err.navigation_intent());
                if matches!(err, DoubtError::Remote(_)) && !store.session().is_authenticated() {
                    return Err(err.into());
                }
            }
        }
    }
}

//
// ─── HISTORY ───────────────────────────────────────────────────────────────────
//

pub async fn show_history(store: &SessionStore, subject: Option<&str>) -> CommandResult {
    print_history(&store.history(), subject).await.map_err(|err| {
        login_hint(err.navigation_intent());
        err.into()
    })
}

async fn print_history(history: &HistoryService, subject: Option<&str>) -> Result<(), AccountError> {
    let profile = history.profile().await?;
    println!(
        "{} <{}>: {} quizzes, {} attempts, {} doubts",
        profile.username,
        profile.email,
        profile.total_quizzes,
        profile.total_quiz_attempts,
        profile.total_doubts
    );

    let quizzes = history.quiz_history(PageRequest::default()).await?;
    println!("\nQuizzes ({} total)", quizzes.total);
    for item in &quizzes.quizzes {
        let latest = item
            .latest_attempt()
            .map_or_else(|| "not attempted".into(), |a| format!("last {}/{}", a.score, a.total_questions));
        println!(
            "  #{} {} - {} questions, best {}, {latest}",
            item.id, item.title, item.total_questions, item.best_score
        );
    }

    let doubts = history
        .doubt_history(PageRequest::default(), subject)
        .await?;
    println!("\nDoubts ({} total)", doubts.total);
    for record in &doubts.doubts {
        let subjects = if record.subjects.is_empty() {
            String::new()
        } else {
            format!(" [{}]", record.subjects.join(", "))
        };
        println!("  #{}{subjects} {}", record.id, record.question);
    }
    Ok(())
}

fn print_prompt(prompt: &str) {
    use std::io::Write;

    print!("{prompt}");
    let _ = std::io::stdout().flush();
}
