use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::Quiz;

/// One learner's run through a quiz. The only entity the engine owns.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Attempt {
    pub id: String,
    pub user_id: String,
    pub quiz_id: String,
    pub course_id: String, // denormalized for querying
    pub attempt_number: i16,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub time_spent: i64, // seconds, set at submission
    pub status: AttemptStatus,
    pub score: f64, // percent, 2 decimals
    pub total_points: i32,
    pub points_earned: i32,
    pub answers: Vec<AttemptAnswer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AttemptAnswer {
    pub question_id: String,
    pub selected_answers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_text: Option<String>,
    /// None until graded, and permanently None for short-answer questions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    pub points_earned: i32,
    pub time_spent: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Completed,
    Abandoned,
    TimeUp,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::InProgress => "in_progress",
            AttemptStatus::Completed => "completed",
            AttemptStatus::Abandoned => "abandoned",
            AttemptStatus::TimeUp => "time_up",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AttemptStatus::InProgress)
    }
}

impl Attempt {
    pub fn start(user_id: &str, quiz: &Quiz, attempt_number: i16) -> Self {
        let now = Utc::now();

        Attempt {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            quiz_id: quiz.id.clone(),
            course_id: quiz.course_id.clone(),
            attempt_number,
            started_at: now,
            completed_at: None,
            time_spent: 0,
            status: AttemptStatus::InProgress,
            score: 0.0,
            total_points: 0,
            points_earned: 0,
            answers: Vec::new(),
            feedback: None,
            created_at: Some(now),
            modified_at: Some(now),
        }
    }

    /// Replaces the answer for the same question, appends otherwise.
    /// Keeps at most one entry per question id.
    pub fn upsert_answer(&mut self, answer: AttemptAnswer) {
        match self
            .answers
            .iter_mut()
            .find(|a| a.question_id == answer.question_id)
        {
            Some(existing) => *existing = answer,
            None => self.answers.push(answer),
        }
    }

    pub fn answer_for(&self, question_id: &str) -> Option<&AttemptAnswer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }
}
