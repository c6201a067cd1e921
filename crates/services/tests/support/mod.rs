#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{Notify, watch};

use services::remote::{
    DownloadedFile, GeneratedQuiz, QuizRecord, RegisterAck, SolveDoubtRequest, SolveOutcome,
    SubmitAck,
};
use services::{AuthToken, BackendApi, RemoteError, SessionStore};
use study_core::model::{
    AttemptSubmission, Credentials, DoubtHistoryPage, DoubtId, DoubtRecord, FileUpload,
    OptionKey, PageRequest, ProfileSummary, QuestionDraft, QuizHistoryPage, QuizId,
    RegistrationProfile,
};
use study_core::time::fixed_clock;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Login(String),
    Register(String),
    Generate { file_name: String, questions_per_section: u8 },
    Solve(SolveDoubtRequest),
    Submit(AttemptSubmission),
    Profile,
    QuizHistory(PageRequest),
    DoubtHistory(PageRequest, Option<String>),
    QuizById(QuizId),
    DoubtById(DoubtId),
    Download(QuizId),
}

type Queue<T> = Mutex<VecDeque<Result<T, RemoteError>>>;

/// Scripted in-memory backend. Each call is recorded, then answered from its
/// queue; an empty queue answers with a network error. While `hold` is
/// armed, calls wait for `release` before answering.
pub struct FakeBackend {
    calls: Mutex<Vec<Call>>,
    call_count: watch::Sender<usize>,
    hold: Mutex<Option<Arc<Notify>>>,
    queues: Queues,
}

#[derive(Default)]
struct Queues {
    login: Queue<AuthToken>,
    register: Queue<RegisterAck>,
    generate: Queue<GeneratedQuiz>,
    solve: Queue<SolveOutcome>,
    submit: Queue<SubmitAck>,
    profile: Queue<ProfileSummary>,
    quiz_history: Queue<QuizHistoryPage>,
    doubt_history: Queue<DoubtHistoryPage>,
    quiz_by_id: Queue<QuizRecord>,
    doubt_by_id: Queue<DoubtRecord>,
    download: Queue<DownloadedFile>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        let (call_count, _) = watch::channel(0);
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            call_count,
            hold: Mutex::new(None),
            queues: Queues::default(),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn submit_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Submit(_)))
            .count()
    }

    pub fn solve_requests(&self) -> Vec<SolveDoubtRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Solve(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    /// Make every following call wait until `release`.
    pub fn hold(&self) {
        *self.hold.lock().unwrap() = Some(Arc::new(Notify::new()));
    }

    /// Let one held call answer.
    pub fn release(&self) {
        if let Some(hold) = self.hold.lock().unwrap().as_ref() {
            hold.notify_one();
        }
    }

    /// Resolve once `count` calls have been recorded in total.
    pub async fn wait_for_calls(&self, count: usize) {
        let mut rx = self.call_count.subscribe();
        let _ = rx.wait_for(|recorded| *recorded >= count).await;
    }

    pub fn push_login(&self, result: Result<AuthToken, RemoteError>) {
        self.queues.login.lock().unwrap().push_back(result);
    }

    pub fn push_generate(&self, result: Result<GeneratedQuiz, RemoteError>) {
        self.queues.generate.lock().unwrap().push_back(result);
    }

    pub fn push_solve(&self, result: Result<SolveOutcome, RemoteError>) {
        self.queues.solve.lock().unwrap().push_back(result);
    }

    pub fn push_answer(&self, answer: &str) {
        self.push_solve(Ok(SolveOutcome::Answer(answer.to_string())));
    }

    pub fn push_submit(&self, result: Result<SubmitAck, RemoteError>) {
        self.queues.submit.lock().unwrap().push_back(result);
    }

    pub fn push_profile(&self, result: Result<ProfileSummary, RemoteError>) {
        self.queues.profile.lock().unwrap().push_back(result);
    }

    pub fn push_doubt_history(&self, result: Result<DoubtHistoryPage, RemoteError>) {
        self.queues.doubt_history.lock().unwrap().push_back(result);
    }

    pub fn push_quiz_by_id(&self, result: Result<QuizRecord, RemoteError>) {
        self.queues.quiz_by_id.lock().unwrap().push_back(result);
    }

    async fn respond<T>(&self, call: Call, queue: &Queue<T>) -> Result<T, RemoteError> {
        self.calls.lock().unwrap().push(call);
        self.call_count.send_modify(|count| *count += 1);
        let hold = self.hold.lock().unwrap().clone();
        if let Some(hold) = hold {
            hold.notified().await;
        }
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::Network("no scripted response".into())))
    }
}

#[async_trait]
impl BackendApi for FakeBackend {
    async fn login(&self, credentials: &Credentials) -> Result<AuthToken, RemoteError> {
        self.respond(Call::Login(credentials.username.clone()), &self.queues.login)
            .await
    }

    async fn register(&self, profile: &RegistrationProfile) -> Result<RegisterAck, RemoteError> {
        self.respond(Call::Register(profile.username.clone()), &self.queues.register)
            .await
    }

    async fn generate_quiz(
        &self,
        _token: &AuthToken,
        file: &FileUpload,
        questions_per_section: u8,
    ) -> Result<GeneratedQuiz, RemoteError> {
        let call = Call::Generate {
            file_name: file.file_name.clone(),
            questions_per_section,
        };
        self.respond(call, &self.queues.generate).await
    }

    async fn solve_doubt(
        &self,
        _token: &AuthToken,
        request: &SolveDoubtRequest,
    ) -> Result<SolveOutcome, RemoteError> {
        self.respond(Call::Solve(request.clone()), &self.queues.solve).await
    }

    async fn submit_quiz_attempt(
        &self,
        _token: &AuthToken,
        submission: &AttemptSubmission,
    ) -> Result<SubmitAck, RemoteError> {
        self.respond(Call::Submit(submission.clone()), &self.queues.submit)
            .await
    }

    async fn get_profile(&self, _token: &AuthToken) -> Result<ProfileSummary, RemoteError> {
        self.respond(Call::Profile, &self.queues.profile).await
    }

    async fn get_quiz_history(
        &self,
        _token: &AuthToken,
        page: PageRequest,
    ) -> Result<QuizHistoryPage, RemoteError> {
        self.respond(Call::QuizHistory(page), &self.queues.quiz_history)
            .await
    }

    async fn get_doubt_history(
        &self,
        _token: &AuthToken,
        page: PageRequest,
        subject: Option<&str>,
    ) -> Result<DoubtHistoryPage, RemoteError> {
        let call = Call::DoubtHistory(page, subject.map(str::to_string));
        self.respond(call, &self.queues.doubt_history).await
    }

    async fn get_quiz_by_id(
        &self,
        _token: &AuthToken,
        id: QuizId,
    ) -> Result<QuizRecord, RemoteError> {
        self.respond(Call::QuizById(id), &self.queues.quiz_by_id).await
    }

    async fn get_doubt_by_id(
        &self,
        _token: &AuthToken,
        id: DoubtId,
    ) -> Result<DoubtRecord, RemoteError> {
        self.respond(Call::DoubtById(id), &self.queues.doubt_by_id).await
    }

    async fn download_file(
        &self,
        _token: &AuthToken,
        id: QuizId,
    ) -> Result<DownloadedFile, RemoteError> {
        self.respond(Call::Download(id), &self.queues.download).await
    }
}

//
// ─── FIXTURES ──────────────────────────────────────────────────────────────────
//

pub fn store(backend: &Arc<FakeBackend>) -> SessionStore {
    SessionStore::with_backend(backend.clone(), fixed_clock(), 2)
}

pub fn signed_in_store(backend: &Arc<FakeBackend>) -> SessionStore {
    let store = store(backend);
    store.session().sign_in(AuthToken::new("token-1"));
    store
}

pub fn draft(prompt: &str, correct: OptionKey) -> QuestionDraft {
    QuestionDraft {
        prompt: prompt.to_string(),
        options: [
            "first".to_string(),
            "second".to_string(),
            "third".to_string(),
            "fourth".to_string(),
        ],
        correct,
        explanation: format!("{prompt} is answered by {correct}"),
    }
}

/// Two sections of two questions; the correct options are 1, 2, 3, 4 in order.
pub fn two_by_two(quiz_id: Option<QuizId>) -> GeneratedQuiz {
    GeneratedQuiz {
        quiz_id,
        title: Some("Cells".to_string()),
        sections: vec![
            vec![draft("Q1", OptionKey::Opt1), draft("Q2", OptionKey::Opt2)],
            vec![draft("Q3", OptionKey::Opt3), draft("Q4", OptionKey::Opt4)],
        ],
        warning: None,
    }
}

pub fn notes_pdf() -> FileUpload {
    FileUpload::new("notes.pdf", "application/pdf", b"%PDF-1.7 notes".to_vec())
}
