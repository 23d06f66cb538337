mod common;

use btca_session::{RetryPolicy, SessionError, ThreadLifecycle};
use btca_types::{NewQuestion, QuestionStatus};
use common::{shared, CountingPersistence};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn lifecycle(store: &Arc<CountingPersistence>) -> ThreadLifecycle {
    ThreadLifecycle::new(store.clone()).with_retry_policy(RetryPolicy::new(3, Duration::ZERO))
}

fn question(prompt: &str) -> NewQuestion {
    NewQuestion::pending(prompt, vec!["svelte".to_string()])
}

#[tokio::test]
async fn test_initialize_thread_is_idempotent() {
    let store = shared(CountingPersistence::default());
    let mut lifecycle = lifecycle(&store);

    lifecycle.initialize_thread().await.unwrap();
    let first = lifecycle.current_thread().unwrap().id.clone();
    lifecycle.initialize_thread().await.unwrap();

    assert_eq!(store.create_thread_calls.load(Ordering::SeqCst), 1);
    assert_eq!(lifecycle.current_thread().unwrap().id, first);
    assert_eq!(store.inner.thread_count().await, 1);
}

#[tokio::test]
async fn test_add_question_requires_thread() {
    let store = shared(CountingPersistence::default());
    let mut lifecycle = lifecycle(&store);

    let err = lifecycle.add_question_to_thread(question("q")).await.unwrap_err();
    assert!(matches!(err, SessionError::ThreadNotInitialized));
}

#[tokio::test]
async fn test_mutators_without_question_are_noops() {
    let store = shared(CountingPersistence::default());
    let mut lifecycle = lifecycle(&store);

    lifecycle.update_last_question_answer("lost").await.unwrap();
    lifecycle.mark_last_question_canceled().await.unwrap();

    lifecycle.initialize_thread().await.unwrap();
    lifecycle.update_last_question_answer("lost").await.unwrap();
    lifecycle.mark_last_question_canceled().await.unwrap();

    assert_eq!(store.answer_calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.status_calls.load(Ordering::SeqCst), 0);
    assert!(lifecycle.current_thread().unwrap().questions.is_empty());
}

#[tokio::test]
async fn test_answer_moves_pending_to_answered() {
    let store = shared(CountingPersistence::default());
    let mut lifecycle = lifecycle(&store);
    lifecycle.initialize_thread().await.unwrap();

    let id = lifecycle.add_question_to_thread(question("q")).await.unwrap();
    assert_eq!(lifecycle.last_question_id(), Some(id.as_str()));
    assert_eq!(
        lifecycle.current_thread().unwrap().last_question().unwrap().status,
        QuestionStatus::Pending
    );

    lifecycle.update_last_question_answer("a").await.unwrap();

    let local = lifecycle.current_thread().unwrap().last_question().unwrap();
    assert_eq!(local.answer, "a");
    assert_eq!(local.status, QuestionStatus::Answered);
    let stored = store.inner.get_question(&id).await.unwrap();
    assert_eq!(stored.answer, "a");
    assert_eq!(stored.status, QuestionStatus::Answered);
}

#[tokio::test]
async fn test_cancel_keeps_answer_and_is_not_revived() {
    let store = shared(CountingPersistence::default());
    let mut lifecycle = lifecycle(&store);
    lifecycle.initialize_thread().await.unwrap();

    let mut prefilled = question("q");
    prefilled.answer = "draft".to_string();
    let id = lifecycle.add_question_to_thread(prefilled).await.unwrap();

    lifecycle.mark_last_question_canceled().await.unwrap();
    let local = lifecycle.current_thread().unwrap().last_question().unwrap();
    assert_eq!(local.status, QuestionStatus::Canceled);
    assert_eq!(local.answer, "draft");

    lifecycle.update_last_question_answer("late").await.unwrap();
    let local = lifecycle.current_thread().unwrap().last_question().unwrap();
    assert_eq!(local.status, QuestionStatus::Canceled);
    assert_eq!(local.answer, "late");
    assert_eq!(store.inner.get_question(&id).await.unwrap().status, QuestionStatus::Canceled);
}

#[tokio::test]
async fn test_only_last_question_is_mutated() {
    let store = shared(CountingPersistence::default());
    let mut lifecycle = lifecycle(&store);
    lifecycle.initialize_thread().await.unwrap();

    let first = lifecycle.add_question_to_thread(question("one")).await.unwrap();
    lifecycle.update_last_question_answer("first answer").await.unwrap();
    let second = lifecycle.add_question_to_thread(question("two")).await.unwrap();
    lifecycle.mark_last_question_canceled().await.unwrap();

    let questions = &lifecycle.current_thread().unwrap().questions;
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].status, QuestionStatus::Answered);
    assert_eq!(questions[1].status, QuestionStatus::Canceled);
    assert_eq!(store.inner.get_question(&first).await.unwrap().answer, "first answer");
    assert_eq!(store.inner.get_question(&second).await.unwrap().status, QuestionStatus::Canceled);
}

#[tokio::test]
async fn test_failed_answer_write_marks_question_unsynced() {
    let store = shared(CountingPersistence::default());
    let mut lifecycle = lifecycle(&store);
    lifecycle.initialize_thread().await.unwrap();
    lifecycle.add_question_to_thread(question("q")).await.unwrap();

    store.failing_writes.store(3, Ordering::SeqCst);
    let err = lifecycle.update_last_question_answer("a").await.unwrap_err();
    assert!(matches!(err, SessionError::Persist(_)));
    assert_eq!(store.answer_calls.load(Ordering::SeqCst), 3);

    // in-memory state keeps the answer and is flagged
    let local_id = lifecycle.current_thread().unwrap().last_question().unwrap().id.clone();
    assert_eq!(lifecycle.unsynced_questions().collect::<Vec<_>>(), vec![local_id.as_str()]);

    lifecycle.update_last_question_answer("a").await.unwrap();
    assert_eq!(lifecycle.unsynced_questions().count(), 0);
}

#[tokio::test]
async fn test_failed_persist_clears_last_question_id() {
    let store = shared(CountingPersistence::default());
    let mut lifecycle = lifecycle(&store);
    lifecycle.initialize_thread().await.unwrap();
    let first = lifecycle.add_question_to_thread(question("one")).await.unwrap();

    store.failing_writes.store(3, Ordering::SeqCst);
    assert!(lifecycle.add_question_to_thread(question("two")).await.is_err());
    assert_eq!(lifecycle.last_question_id(), None);

    // must not land on the first question's record
    lifecycle.update_last_question_answer("stray").await.unwrap();
    assert_eq!(store.inner.get_question(&first).await.unwrap().answer, "");
}

#[tokio::test]
async fn test_retry_policy_gives_up_on_permanent_errors() {
    let store = shared(CountingPersistence::default());
    let mut lifecycle = lifecycle(&store);
    lifecycle.initialize_thread().await.unwrap();
    lifecycle.add_question_to_thread(question("q")).await.unwrap();
    lifecycle.set_last_question_id(Some("missing".to_string()));

    let err = lifecycle.update_last_question_answer("a").await.unwrap_err();

    assert!(matches!(err, SessionError::Persist(_)));
    assert_eq!(store.answer_calls.load(Ordering::SeqCst), 1);
}
