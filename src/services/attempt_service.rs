use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::errors::{AppError, AppResult};
use crate::models::domain::attempt::{Attempt, AttemptAnswer, AttemptStatus};
use crate::models::dto::request::{AnswerInput, StartAttemptInput, SubmitAttemptInput};
use crate::models::dto::response::{AttemptDetails, AttemptSummary, QuestionReview};
use crate::repositories::{AttemptRepository, QuestionRepository, QuizRepository};
use crate::services::availability::check_available;
use crate::services::grading;

/// Orchestrates the attempt state machine: start, autosave, submit, review.
pub struct AttemptService {
    quiz_repository: Arc<dyn QuizRepository>,
    question_repository: Arc<dyn QuestionRepository>,
    attempt_repository: Arc<dyn AttemptRepository>,
}

impl AttemptService {
    pub fn new(
        quiz_repository: Arc<dyn QuizRepository>,
        question_repository: Arc<dyn QuestionRepository>,
        attempt_repository: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            quiz_repository,
            question_repository,
            attempt_repository,
        }
    }

    /// Starts a new attempt, or resumes the caller's in-progress one.
    ///
    /// The resume check runs before attempt numbering so that a retried
    /// request can never fork a second in-progress attempt, even when the
    /// open attempt is the last one the quiz allows.
    pub async fn start_attempt(
        &self,
        user_id: &str,
        input: StartAttemptInput,
    ) -> AppResult<Attempt> {
        input.validate()?;

        let quiz = self
            .quiz_repository
            .find_by_id(&input.quiz_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Quiz with id '{}' not found", input.quiz_id))
            })?;

        check_available(&quiz, Utc::now())?;

        if let Some(existing) = self
            .attempt_repository
            .find_in_progress(user_id, &quiz.id)
            .await?
        {
            return Ok(existing);
        }

        let attempt_number = self
            .attempt_repository
            .max_attempt_number(user_id, &quiz.id)
            .await?
            + 1;

        if attempt_number > quiz.attempts_allowed {
            return Err(AppError::AttemptLimitExceeded(format!(
                "Maximum of {} attempts reached for quiz '{}'",
                quiz.attempts_allowed, quiz.id
            )));
        }

        let attempt = Attempt::start(user_id, &quiz, attempt_number);

        match self.attempt_repository.insert(attempt).await {
            Ok(created) => {
                log::info!(
                    "Started attempt {} (#{}) on quiz '{}' for user '{}'",
                    created.id,
                    created.attempt_number,
                    created.quiz_id,
                    created.user_id
                );
                Ok(created)
            }
            // Lost a concurrent start race. The winner holds the in-progress
            // attempt, so hand that one back instead of failing the caller.
            Err(AppError::Conflict(reason)) => self
                .attempt_repository
                .find_in_progress(user_id, &quiz.id)
                .await?
                .ok_or(AppError::Conflict(reason)),
            Err(err) => Err(err),
        }
    }

    /// Autosaves a single answer. No grading happens here: correctness must
    /// not leak back to the client before submission, and autosave has to
    /// stay cheap.
    pub async fn save_answer(
        &self,
        attempt_id: &str,
        user_id: &str,
        answer: AnswerInput,
    ) -> AppResult<Attempt> {
        answer.validate()?;

        let mut attempt = self.owned_attempt(attempt_id, user_id).await?;
        ensure_in_progress(&attempt)?;

        attempt.upsert_answer(AttemptAnswer {
            question_id: answer.question_id,
            selected_answers: answer.selected_answers,
            answer_text: answer.answer_text,
            is_correct: None,
            points_earned: 0,
            time_spent: answer.time_spent,
        });
        attempt.modified_at = Some(Utc::now());

        self.attempt_repository.update_in_progress(attempt).await
    }

    /// Grades the submission against the quiz's current question set and
    /// finalizes the attempt. Points, options, and the pass mark may all
    /// have changed since the attempt started; scores deliberately reflect
    /// the live definition rather than a frozen snapshot.
    pub async fn submit_attempt(
        &self,
        attempt_id: &str,
        user_id: &str,
        submission: SubmitAttemptInput,
    ) -> AppResult<Attempt> {
        submission.validate()?;

        let mut attempt = self.owned_attempt(attempt_id, user_id).await?;
        ensure_in_progress(&attempt)?;

        let quiz = self
            .quiz_repository
            .find_by_id(&attempt.quiz_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Quiz with id '{}' not found", attempt.quiz_id))
            })?;

        let questions = self
            .question_repository
            .find_by_ids(&quiz.question_order)
            .await?;

        let outcome = grading::grade(&questions, &submission.answers);

        let completed_at = Utc::now();
        let time_spent = (completed_at - attempt.started_at).num_seconds().max(0);

        // A submission past the time limit is still graded; the status
        // records the cause.
        attempt.status = if quiz.time_limit_seconds > 0 && time_spent > quiz.time_limit_seconds {
            AttemptStatus::TimeUp
        } else {
            AttemptStatus::Completed
        };
        attempt.answers = outcome.answers;
        attempt.points_earned = outcome.points_earned;
        attempt.total_points = outcome.total_points;
        attempt.score = outcome.score;
        attempt.time_spent = time_spent;
        attempt.completed_at = Some(completed_at);
        attempt.feedback = Some(if outcome.score >= quiz.pass_mark_percent {
            format!("Congratulations! You passed with {}%", outcome.score)
        } else {
            format!(
                "You scored {}%. The passing mark is {}%.",
                outcome.score, quiz.pass_mark_percent
            )
        });
        attempt.modified_at = Some(completed_at);

        let attempt = self.attempt_repository.update_in_progress(attempt).await?;
        log::info!(
            "Attempt {} finished as {} with score {}%",
            attempt.id,
            attempt.status.as_str(),
            attempt.score
        );
        Ok(attempt)
    }

    /// Attempt plus the live question set prepared for review.
    pub async fn get_attempt_details(
        &self,
        attempt_id: &str,
        user_id: &str,
    ) -> AppResult<AttemptDetails> {
        let attempt = self.owned_attempt(attempt_id, user_id).await?;

        let quiz = self
            .quiz_repository
            .find_by_id(&attempt.quiz_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Quiz with id '{}' not found", attempt.quiz_id))
            })?;

        let questions = self
            .question_repository
            .find_by_ids(&quiz.question_order)
            .await?;

        let reviews: Vec<QuestionReview> = questions
            .into_iter()
            .map(|question| {
                let user_answer = attempt.answer_for(&question.id).cloned();
                QuestionReview {
                    is_answered: user_answer.is_some(),
                    user_answer,
                    question,
                }
            })
            .collect();

        let summary = AttemptSummary {
            total_questions: reviews.len(),
            answered_questions: attempt.answers.len(),
            correct_answers: attempt
                .answers
                .iter()
                .filter(|a| a.is_correct == Some(true))
                .count(),
            time_spent: format_time(attempt.time_spent),
        };

        Ok(AttemptDetails {
            quiz_title: quiz.title,
            pass_mark_percent: quiz.pass_mark_percent,
            attempt,
            questions: reviews,
            summary,
        })
    }

    /// Attempt history for a user, newest started first.
    pub async fn get_user_attempts(
        &self,
        user_id: &str,
        course_id: Option<&str>,
    ) -> AppResult<Vec<Attempt>> {
        self.attempt_repository
            .find_by_user(user_id, course_id)
            .await
    }

    pub async fn get_current_attempt(
        &self,
        user_id: &str,
        quiz_id: &str,
    ) -> AppResult<Option<Attempt>> {
        self.attempt_repository
            .find_in_progress(user_id, quiz_id)
            .await
    }

    /// Administrative transition for attempts the learner walked away from.
    /// No grading runs; there is no ownership check because the caller is
    /// not the learner.
    pub async fn abandon_attempt(&self, attempt_id: &str) -> AppResult<Attempt> {
        let mut attempt = self
            .attempt_repository
            .find_by_id(attempt_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Attempt with id '{}' not found", attempt_id))
            })?;
        ensure_in_progress(&attempt)?;

        attempt.status = AttemptStatus::Abandoned;
        attempt.modified_at = Some(Utc::now());

        self.attempt_repository.update_in_progress(attempt).await
    }

    async fn owned_attempt(&self, attempt_id: &str, user_id: &str) -> AppResult<Attempt> {
        let attempt = self
            .attempt_repository
            .find_by_id(attempt_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Attempt with id '{}' not found", attempt_id))
            })?;

        if attempt.user_id != user_id {
            return Err(AppError::Forbidden(
                "You can only access your own quiz attempts".to_string(),
            ));
        }

        Ok(attempt)
    }
}

fn ensure_in_progress(attempt: &Attempt) -> AppResult<()> {
    if attempt.status.is_terminal() {
        return Err(AppError::Conflict(format!(
            "Attempt '{}' is {}; only in-progress attempts can be modified",
            attempt.id,
            attempt.status.as_str()
        )));
    }
    Ok(())
}

fn format_time(seconds: i64) -> String {
    let minutes = seconds / 60;
    let remaining_seconds = seconds % 60;
    format!("{}m {}s", minutes, remaining_seconds)
}
