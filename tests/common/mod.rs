#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use attempt_engine::{
    errors::{AppError, AppResult},
    models::domain::{
        attempt::{Attempt, AttemptStatus},
        question::{Difficulty, Question, QuestionOption, QuestionType},
        quiz::QuizStatus,
        Quiz,
    },
    repositories::{AttemptRepository, QuestionRepository, QuizRepository},
    services::{attempt_service::AttemptService, stats_service::StatsService},
};

pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct InMemoryQuizRepository {
    pub quizzes: Arc<RwLock<HashMap<String, Quiz>>>,
}

impl InMemoryQuizRepository {
    pub fn new() -> Self {
        Self {
            quizzes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn insert(&self, quiz: Quiz) {
        self.quizzes.write().await.insert(quiz.id.clone(), quiz);
    }
}

#[async_trait]
impl QuizRepository for InMemoryQuizRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Quiz>> {
        let quizzes = self.quizzes.read().await;
        Ok(quizzes.get(id).cloned())
    }
}

pub struct InMemoryQuestionRepository {
    pub questions: Arc<RwLock<HashMap<String, Question>>>,
}

impl InMemoryQuestionRepository {
    pub fn new() -> Self {
        Self {
            questions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn insert(&self, question: Question) {
        self.questions
            .write()
            .await
            .insert(question.id.clone(), question);
    }

    pub async fn remove(&self, question_id: &str) {
        self.questions.write().await.remove(question_id);
    }
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionRepository {
    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<Question>> {
        let questions = self.questions.read().await;
        let mut items: Vec<Question> = ids
            .iter()
            .filter_map(|id| questions.get(id).cloned())
            .collect();
        items.sort_by_key(|q| q.position);
        Ok(items)
    }

    async fn find_by_quiz(&self, quiz_id: &str) -> AppResult<Vec<Question>> {
        let questions = self.questions.read().await;
        let mut items: Vec<Question> = questions
            .values()
            .filter(|q| q.quiz_id == quiz_id)
            .cloned()
            .collect();
        items.sort_by_key(|q| q.position);
        Ok(items)
    }
}

pub struct InMemoryAttemptRepository {
    pub attempts: Arc<RwLock<HashMap<String, Attempt>>>,
}

impl InMemoryAttemptRepository {
    pub fn new() -> Self {
        Self {
            attempts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn count(&self) -> usize {
        self.attempts.read().await.len()
    }

    pub async fn set_started_at(&self, attempt_id: &str, started_at: DateTime<Utc>) {
        let mut attempts = self.attempts.write().await;
        if let Some(attempt) = attempts.get_mut(attempt_id) {
            attempt.started_at = started_at;
        }
    }
}

#[async_trait]
impl AttemptRepository for InMemoryAttemptRepository {
    async fn insert(&self, attempt: Attempt) -> AppResult<Attempt> {
        let mut attempts = self.attempts.write().await;

        if attempts.contains_key(&attempt.id) {
            return Err(AppError::Conflict(format!(
                "Attempt with id '{}' already exists",
                attempt.id
            )));
        }

        // Mirrors the unique (user_id, quiz_id, attempt_number) index.
        let duplicate_number = attempts.values().any(|a| {
            a.user_id == attempt.user_id
                && a.quiz_id == attempt.quiz_id
                && a.attempt_number == attempt.attempt_number
        });
        if duplicate_number {
            return Err(AppError::Conflict(format!(
                "Attempt number {} already exists for user '{}' on quiz '{}'",
                attempt.attempt_number, attempt.user_id, attempt.quiz_id
            )));
        }

        attempts.insert(attempt.id.clone(), attempt.clone());
        Ok(attempt)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Attempt>> {
        let attempts = self.attempts.read().await;
        Ok(attempts.get(id).cloned())
    }

    async fn find_in_progress(
        &self,
        user_id: &str,
        quiz_id: &str,
    ) -> AppResult<Option<Attempt>> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .values()
            .find(|a| {
                a.user_id == user_id
                    && a.quiz_id == quiz_id
                    && a.status == AttemptStatus::InProgress
            })
            .cloned())
    }

    async fn max_attempt_number(&self, user_id: &str, quiz_id: &str) -> AppResult<i16> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .values()
            .filter(|a| a.user_id == user_id && a.quiz_id == quiz_id)
            .map(|a| a.attempt_number)
            .max()
            .unwrap_or(0))
    }

    async fn update_in_progress(&self, attempt: Attempt) -> AppResult<Attempt> {
        let mut attempts = self.attempts.write().await;

        // Conditioned on the stored attempt still being in progress, like
        // the replace_one filter in the Mongo implementation.
        let still_in_progress = attempts
            .get(&attempt.id)
            .map(|stored| stored.status == AttemptStatus::InProgress)
            .unwrap_or(false);
        if !still_in_progress {
            return Err(AppError::Conflict(format!(
                "Attempt '{}' is no longer in progress",
                attempt.id
            )));
        }

        attempts.insert(attempt.id.clone(), attempt.clone());
        Ok(attempt)
    }

    async fn find_by_user(
        &self,
        user_id: &str,
        course_id: Option<&str>,
    ) -> AppResult<Vec<Attempt>> {
        let attempts = self.attempts.read().await;
        let mut items: Vec<Attempt> = attempts
            .values()
            .filter(|a| {
                a.user_id == user_id
                    && course_id.map(|cid| a.course_id == cid).unwrap_or(true)
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(items)
    }

    async fn find_completed_by_quiz(&self, quiz_id: &str) -> AppResult<Vec<Attempt>> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .values()
            .filter(|a| a.quiz_id == quiz_id && a.status == AttemptStatus::Completed)
            .cloned()
            .collect())
    }

    async fn find_completed_by_user(
        &self,
        user_id: &str,
        quiz_id: Option<&str>,
    ) -> AppResult<Vec<Attempt>> {
        let attempts = self.attempts.read().await;
        let mut items: Vec<Attempt> = attempts
            .values()
            .filter(|a| {
                a.user_id == user_id
                    && a.status == AttemptStatus::Completed
                    && quiz_id.map(|qid| a.quiz_id == qid).unwrap_or(true)
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(items)
    }
}

/// Everything a service-level test needs, wired over shared in-memory state.
pub struct TestContext {
    pub quizzes: Arc<InMemoryQuizRepository>,
    pub questions: Arc<InMemoryQuestionRepository>,
    pub attempts: Arc<InMemoryAttemptRepository>,
    pub attempt_service: AttemptService,
    pub stats_service: StatsService,
}

pub fn test_context() -> TestContext {
    let quizzes = Arc::new(InMemoryQuizRepository::new());
    let questions = Arc::new(InMemoryQuestionRepository::new());
    let attempts = Arc::new(InMemoryAttemptRepository::new());

    let attempt_service = AttemptService::new(
        quizzes.clone(),
        questions.clone(),
        attempts.clone(),
    );
    let stats_service = StatsService::new(
        quizzes.clone(),
        questions.clone(),
        attempts.clone(),
    );

    TestContext {
        quizzes,
        questions,
        attempts,
        attempt_service,
        stats_service,
    }
}

pub fn make_quiz(id: &str, question_order: Vec<String>) -> Quiz {
    Quiz {
        id: id.to_string(),
        course_id: "course-1".to_string(),
        module_id: None,
        lesson_id: None,
        title: format!("Quiz {}", id),
        instructions: None,
        time_limit_seconds: 0,
        attempts_allowed: 3,
        pass_mark_percent: 70.0,
        order: 0,
        status: QuizStatus::Published,
        available_from: None,
        available_until: None,
        shuffle_questions: false,
        shuffle_options: false,
        question_order,
        total_points: 0,
        created_at: Some(Utc::now()),
        modified_at: Some(Utc::now()),
    }
}

fn base_question(id: &str, quiz_id: &str, points: i32) -> Question {
    Question {
        id: id.to_string(),
        quiz_id: quiz_id.to_string(),
        question_type: QuestionType::SingleChoice,
        text: format!("Question {}", id),
        explanation: None,
        options: Vec::new(),
        answer_text: None,
        points,
        position: 0,
        time_limit_seconds: 0,
        difficulty: Difficulty::Medium,
        created_at: Some(Utc::now()),
        modified_at: Some(Utc::now()),
    }
}

fn make_option(id: String, text: &str, is_correct: bool) -> QuestionOption {
    QuestionOption {
        id,
        text: text.to_string(),
        is_correct,
        explanation: None,
    }
}

/// Four options `{id}-opt-a` through `{id}-opt-d`; `{id}-opt-b` is correct.
pub fn single_choice_question(id: &str, quiz_id: &str, points: i32) -> Question {
    let mut question = base_question(id, quiz_id, points);
    question.options = vec![
        make_option(format!("{}-opt-a", id), "Option A", false),
        make_option(format!("{}-opt-b", id), "Option B", true),
        make_option(format!("{}-opt-c", id), "Option C", false),
        make_option(format!("{}-opt-d", id), "Option D", false),
    ];
    question
}

/// Two options `{id}-true` (correct) and `{id}-false`.
pub fn true_false_question(id: &str, quiz_id: &str, points: i32) -> Question {
    let mut question = base_question(id, quiz_id, points);
    question.question_type = QuestionType::TrueFalse;
    question.options = vec![
        make_option(format!("{}-true", id), "True", true),
        make_option(format!("{}-false", id), "False", false),
    ];
    question
}

pub fn short_answer_question(id: &str, quiz_id: &str, points: i32) -> Question {
    let mut question = base_question(id, quiz_id, points);
    question.question_type = QuestionType::ShortAnswer;
    question.answer_text = Some("Reference answer".to_string());
    question
}
