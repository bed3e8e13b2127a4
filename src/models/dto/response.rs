use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::attempt::{Attempt, AttemptAnswer};
use crate::models::domain::question::{Difficulty, Question, QuestionType};

/// A completed or in-flight attempt prepared for review by the learner.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptDetails {
    pub attempt: Attempt,
    pub quiz_title: String,
    pub pass_mark_percent: f64,
    pub questions: Vec<QuestionReview>,
    pub summary: AttemptSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionReview {
    pub question: Question,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<AttemptAnswer>,
    pub is_answered: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptSummary {
    pub total_questions: usize,
    pub answered_questions: usize,
    pub correct_answers: usize,
    pub time_spent: String, // "Xm Ys"
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizStats {
    pub quiz_id: String,
    pub title: String,
    pub total_questions: usize,
    pub total_points: i32,
    pub completed_attempts: u64,
    pub average_score: f64,
    pub average_difficulty: Difficulty,
    pub question_stats: Vec<QuestionStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionStats {
    pub question_id: String,
    pub text: String,
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    pub points: i32,
    pub options: Vec<OptionStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionStats {
    pub option_id: String,
    pub text: String,
    pub is_correct: bool,
    pub selection_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub total_quizzes_attempted: usize,
    pub total_attempts: usize,
    pub passed_quizzes: usize,
    pub average_score: f64,
    pub quiz_stats: Vec<UserQuizStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserQuizStats {
    pub quiz_id: String,
    pub title: String,
    pub pass_mark_percent: f64,
    pub attempts: usize,
    pub best_score: f64,
    pub average_score: f64,
    pub total_time_spent: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_completed_at: Option<DateTime<Utc>>,
    pub passed: bool,
}
