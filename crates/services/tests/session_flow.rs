use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use quiz_core::model::QuestionId;
use quiz_core::time::fixed_clock;
use services::{
    Advance, AnswerOutcome, FetchError, QuizGateway, QuizLoopService, SessionError, SessionState,
};
use storage::repository::{
    InMemoryRepository, QuestionRecord, QuizAdminRepository, QuizInfoRecord, QuizRepository,
    StorageError,
};

/// Store wrapper that counts increments and can be told to fail them.
#[derive(Clone)]
struct CountingStore {
    inner: InMemoryRepository,
    increments: Arc<AtomicUsize>,
    fail_increments: bool,
}

impl CountingStore {
    fn new(inner: InMemoryRepository) -> Self {
        Self {
            inner,
            increments: Arc::new(AtomicUsize::new(0)),
            fail_increments: false,
        }
    }

    fn failing(mut self) -> Self {
        self.fail_increments = true;
        self
    }

    fn increments(&self) -> usize {
        self.increments.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuizRepository for CountingStore {
    async fn get_quiz_info(&self) -> Result<QuizInfoRecord, StorageError> {
        self.inner.get_quiz_info().await
    }

    async fn list_questions(&self) -> Result<Vec<QuestionRecord>, StorageError> {
        self.inner.list_questions().await
    }

    async fn increment_attendance(&self) -> Result<u32, StorageError> {
        self.increments.fetch_add(1, Ordering::SeqCst);
        if self.fail_increments {
            return Err(StorageError::Connection("offline".into()));
        }
        self.inner.increment_attendance().await
    }
}

async fn seeded_repo(answers: &[&str]) -> InMemoryRepository {
    let repo = InMemoryRepository::new();
    repo.upsert_quiz_info(&QuizInfoRecord {
        title: "Animals".into(),
        people_attended: 10,
        rules: vec!["Answer honestly".into()],
    })
    .await
    .unwrap();
    for (position, answer) in (0_u32..).zip(answers) {
        repo.upsert_question(&QuestionRecord {
            id: QuestionId::random(),
            position,
            prompt: format!("Question {}", position + 1),
            options: vec!["Cat".into(), "Dog".into(), "Owl".into()],
            answer: (*answer).to_string(),
        })
        .await
        .unwrap();
    }
    repo
}

fn loop_service(store: &CountingStore) -> QuizLoopService {
    QuizLoopService::new(fixed_clock(), QuizGateway::on_current_runtime(Arc::new(store.clone())))
}

#[tokio::test]
async fn completed_session_commits_attendance_exactly_once() {
    let repo = seeded_repo(&["Cat", "Dog", "Owl", "Cat"]).await;
    let store = CountingStore::new(repo.clone());
    let svc = loop_service(&store);

    let (mut bundle, mut session) = svc.fetch_and_start().await.unwrap();
    assert_eq!(bundle.overview().question_count, 4);

    // Correct on questions 1 and 3, wrong on 2 and 4.
    for choice in ["Cat", "Owl", "Owl", "Dog"] {
        session.select_answer(choice).unwrap();
        session.advance().unwrap();
    }
    assert_eq!(session.state(), SessionState::ReadyToFinish);

    let finished = svc.finish(&mut session, &mut bundle.meta).unwrap();
    assert!((finished.score_card.percent() - 50.0).abs() < f64::EPSILON);
    assert_eq!(finished.score_card.percent_label(), "50%");
    assert_eq!(bundle.meta.people_attended(), 11);

    finished.commit.await.unwrap();
    assert_eq!(store.increments(), 1);
    assert_eq!(repo.get_quiz_info().await.unwrap().people_attended, 11);

    assert!(matches!(
        svc.finish(&mut session, &mut bundle.meta),
        Err(SessionError::Completed)
    ));
    assert_eq!(store.increments(), 1);
    assert_eq!(bundle.meta.people_attended(), 11);
}

#[test]
fn finishing_from_a_plain_thread_still_commits() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let repo = rt.block_on(seeded_repo(&["Dog", "Cat"]));
    let store = CountingStore::new(repo.clone());
    let gateway = QuizGateway::new(Arc::new(store.clone()), rt.handle().clone());
    let svc = QuizLoopService::new(fixed_clock(), gateway);

    let (mut bundle, mut session) = rt.block_on(svc.fetch_and_start()).unwrap();
    session.select_answer("Dog").unwrap();
    session.advance().unwrap();
    session.select_answer("Dog").unwrap();

    // No runtime context on this thread: the gateway spawns on its own handle.
    let finished = svc.finish(&mut session, &mut bundle.meta).unwrap();
    assert_eq!(finished.score_card.percent_label(), "50%");
    rt.block_on(finished.commit).unwrap();

    assert_eq!(store.increments(), 1);
    let info = rt.block_on(repo.get_quiz_info()).unwrap();
    assert_eq!(info.people_attended, 11);
}

#[tokio::test]
async fn abandoned_session_commits_nothing() {
    let repo = seeded_repo(&["Cat", "Dog"]).await;
    let store = CountingStore::new(repo.clone());
    let svc = loop_service(&store);

    let (_bundle, mut session) = svc.fetch_and_start().await.unwrap();
    session.select_answer("Cat").unwrap();
    session.advance().unwrap();
    svc.abandon(session).unwrap();

    tokio::task::yield_now().await;
    assert_eq!(store.increments(), 0);
    assert_eq!(repo.get_quiz_info().await.unwrap().people_attended, 10);
}

#[tokio::test]
async fn failed_commit_does_not_undo_the_score() {
    let repo = seeded_repo(&["Owl"]).await;
    let store = CountingStore::new(repo.clone()).failing();
    let svc = loop_service(&store);

    let (mut bundle, mut session) = svc.fetch_and_start().await.unwrap();
    assert_eq!(session.select_answer("Owl").unwrap(), AnswerOutcome::Correct);
    assert_eq!(session.advance().unwrap(), Advance::ReadyToFinish);

    let finished = svc.finish(&mut session, &mut bundle.meta).unwrap();
    finished.commit.await.unwrap();

    assert_eq!(store.increments(), 1);
    assert!((finished.score_card.percent() - 100.0).abs() < f64::EPSILON);
    assert!(session.is_complete());
    assert_eq!(repo.get_quiz_info().await.unwrap().people_attended, 10);
}

#[tokio::test]
async fn invalid_question_record_prevents_session() {
    let repo = seeded_repo(&["Cat", "Parrot"]).await;
    let store = CountingStore::new(repo);
    let svc = loop_service(&store);

    let err = svc.fetch_and_start().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Fetch(FetchError::Validation { position: 1, .. })
    ));
}

#[tokio::test]
async fn quiz_without_questions_cannot_start() {
    let repo = seeded_repo(&[]).await;
    let store = CountingStore::new(repo);
    let svc = loop_service(&store);

    let bundle = svc.load_quiz().await.unwrap();
    assert!(matches!(
        svc.start_session(&bundle),
        Err(SessionError::Empty)
    ));
}

#[tokio::test]
async fn shuffled_options_keep_scoring_intact() {
    let repo = seeded_repo(&["Dog", "Owl", "Cat"]).await;
    let store = CountingStore::new(repo);
    let svc = loop_service(&store).with_shuffle_options(true);

    let (bundle, mut session) = svc.fetch_and_start().await.unwrap();
    for (index, original) in bundle.questions.iter().enumerate() {
        let current = session.current_question();
        let mut shuffled = current.options().to_vec();
        let mut expected = original.options().to_vec();
        shuffled.sort();
        expected.sort();
        assert_eq!(shuffled, expected);

        let answer = current.correct_answer().to_owned();
        assert_eq!(session.select_answer(&answer).unwrap(), AnswerOutcome::Correct);
        if index + 1 < bundle.questions.len() {
            session.advance().unwrap();
        }
    }
    assert_eq!(session.score(), 3);
}

#[tokio::test]
async fn session_questions_are_independent_of_the_bundle() {
    let repo = seeded_repo(&["Cat", "Dog"]).await;
    let store = CountingStore::new(repo);
    let svc = loop_service(&store);

    let bundle = svc.load_quiz().await.unwrap();
    let mut first = svc.start_session(&bundle).unwrap();
    first.select_answer("Cat").unwrap();

    let second = svc.start_session(&bundle).unwrap();
    assert_eq!(second.selected_answer(), None);
    assert_eq!(second.score(), 0);
}
