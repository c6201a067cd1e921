mod support;

use services::{
    AccountError, AttemptMetadata, AuthToken, ErrorKind, GateDecision, NavigationIntent,
    QuizError, QuizSource, RemoteError,
};
use study_core::model::{
    Credentials, DoubtHistoryPage, OptionKey, PageRequest, QuestionId, QuizId, SectionId,
};

use support::{Call, FakeBackend, signed_in_store, store, two_by_two};

#[tokio::test]
async fn login_opens_the_gate() {
    let backend = FakeBackend::new();
    backend.push_login(Ok(AuthToken::new("fresh")));
    let store = store(&backend);
    assert_eq!(store.gate().decide(), GateDecision::Login);

    let credentials = Credentials::new("ada", "lovelace").unwrap();
    store.login(&credentials).await.unwrap();

    assert_eq!(store.gate().decide(), GateDecision::Protected);
    assert_eq!(store.session().token(), Some(AuthToken::new("fresh")));
    assert_eq!(backend.calls(), vec![Call::Login("ada".into())]);
}

#[tokio::test]
async fn rejected_login_leaves_the_session_empty() {
    let backend = FakeBackend::new();
    backend.push_login(Err(RemoteError::Unauthorized));
    let store = store(&backend);

    let credentials = Credentials::new("ada", "wrong").unwrap();
    let err = store.login(&credentials).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(!store.session().is_authenticated());
}

#[tokio::test]
async fn calls_without_a_token_never_reach_the_backend() {
    let backend = FakeBackend::new();
    let store = store(&backend);

    let err = store
        .history()
        .quiz_history(PageRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err, AccountError::Remote(RemoteError::Unauthorized));
    assert_eq!(err.navigation_intent(), Some(NavigationIntent::ShowLogin));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn unauthorized_response_signs_out_every_view() {
    let backend = FakeBackend::new();
    backend.push_profile(Err(RemoteError::Unauthorized));
    let store = signed_in_store(&backend);
    let mut quiz_view = store.gate().watch();
    let mut doubt_view = store.session().subscribe();
    assert_eq!(quiz_view.decision(), GateDecision::Protected);

    let err = store.history().profile().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);

    assert_eq!(store.session().token(), None);
    assert!(!store.gate().is_authorized());
    assert_eq!(quiz_view.changed().await, Some(GateDecision::Login));
    assert_eq!(doubt_view.changed().await, Some(GateDecision::Login));
}

#[tokio::test]
async fn unauthorized_submit_invalidates_and_keeps_the_attempt() {
    let backend = FakeBackend::new();
    backend.push_submit(Err(RemoteError::Unauthorized));
    let store = signed_in_store(&backend);
    let quiz = store.quiz();
    quiz.load_quiz(QuizSource::Generated(two_by_two(Some(QuizId::new(2)))))
        .unwrap();
    for (section, question) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
        quiz.select_answer(
            SectionId::new(section),
            QuestionId::new(question),
            OptionKey::Opt1,
        )
        .unwrap();
    }

    let err = quiz.submit(AttemptMetadata::default()).await.unwrap_err();
    assert_eq!(err, QuizError::Remote(RemoteError::Unauthorized));
    assert_eq!(err.navigation_intent(), Some(NavigationIntent::ShowLogin));
    assert!(!store.session().is_authenticated());
    assert!(quiz.snapshot().attempt.unwrap().completed());
}

#[tokio::test]
async fn unauthorized_doubt_invalidates_the_session() {
    let backend = FakeBackend::new();
    backend.push_solve(Err(RemoteError::Unauthorized));
    let store = signed_in_store(&backend);

    let err = store.doubt().ask_first("What is X?").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_eq!(store.gate().decide(), GateDecision::Login);
}

#[tokio::test]
async fn blank_subject_filter_is_dropped() {
    let backend = FakeBackend::new();
    backend.push_doubt_history(Ok(DoubtHistoryPage {
        total: 0,
        doubts: Vec::new(),
    }));
    let store = signed_in_store(&backend);

    let page = store
        .history()
        .doubt_history(PageRequest::default(), Some("   "))
        .await
        .unwrap();
    assert_eq!(page.total, 0);
    assert_eq!(
        backend.calls(),
        vec![Call::DoubtHistory(PageRequest::default(), None)]
    );
}

#[tokio::test]
async fn logout_clears_engines_and_session() {
    let backend = FakeBackend::new();
    backend.push_answer("Yes.");
    let store = signed_in_store(&backend);
    store
        .quiz()
        .load_quiz(QuizSource::Generated(two_by_two(Some(QuizId::new(1)))))
        .unwrap();
    store.doubt().ask_first("Is it?").await.unwrap();

    store.logout();

    assert!(!store.session().is_authenticated());
    assert!(store.quiz().snapshot().attempt.is_none());
    assert!(store.doubt().snapshot().conversation.is_empty());
}
