use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{AppError, AppResult};
use crate::models::domain::question::{Difficulty, Question};
use crate::models::dto::response::{
    OptionStats, QuestionStats, QuizStats, UserQuizStats, UserStats,
};
use crate::repositories::{AttemptRepository, QuestionRepository, QuizRepository};

/// Read-only summaries over completed attempts. Never mutates state.
pub struct StatsService {
    quiz_repository: Arc<dyn QuizRepository>,
    question_repository: Arc<dyn QuestionRepository>,
    attempt_repository: Arc<dyn AttemptRepository>,
}

impl StatsService {
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

    /// Per-question aggregates for one quiz, with option selection counts
    /// computed from completed attempts. Counts are zero when no one has
    /// finished the quiz yet.
    pub async fn quiz_stats(&self, quiz_id: &str) -> AppResult<QuizStats> {
        let quiz = self
            .quiz_repository
            .find_by_id(quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", quiz_id)))?;

        let questions = self.question_repository.find_by_quiz(quiz_id).await?;
        let attempts = self.attempt_repository.find_completed_by_quiz(quiz_id).await?;

        let mut selections: HashMap<(String, String), u64> = HashMap::new();
        for attempt in &attempts {
            for answer in &attempt.answers {
                for option_id in &answer.selected_answers {
                    *selections
                        .entry((answer.question_id.clone(), option_id.clone()))
                        .or_insert(0) += 1;
                }
            }
        }

        let question_stats = questions
            .iter()
            .map(|question| QuestionStats {
                question_id: question.id.clone(),
                text: question.text.clone(),
                question_type: question.question_type,
                difficulty: question.difficulty,
                points: question.points,
                options: question
                    .options
                    .iter()
                    .map(|opt| OptionStats {
                        option_id: opt.id.clone(),
                        text: opt.text.clone(),
                        is_correct: opt.is_correct,
                        selection_count: selections
                            .get(&(question.id.clone(), opt.id.clone()))
                            .copied()
                            .unwrap_or(0),
                    })
                    .collect(),
            })
            .collect();

        let average_score = if attempts.is_empty() {
            0.0
        } else {
            attempts.iter().map(|a| a.score).sum::<f64>() / attempts.len() as f64
        };

        Ok(QuizStats {
            quiz_id: quiz.id,
            title: quiz.title,
            total_questions: questions.len(),
            total_points: questions.iter().map(|q| q.points).sum(),
            completed_attempts: attempts.len() as u64,
            average_score,
            average_difficulty: average_difficulty(&questions),
            question_stats,
        })
    }

    /// Groups a user's completed attempts by quiz. Pass/fail uses each
    /// quiz's own pass mark. Quizzes deleted since the attempts were made
    /// are skipped.
    pub async fn user_stats(&self, user_id: &str, quiz_id: Option<&str>) -> AppResult<UserStats> {
        let attempts = self
            .attempt_repository
            .find_completed_by_user(user_id, quiz_id)
            .await?;

        let mut grouped: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, attempt) in attempts.iter().enumerate() {
            grouped
                .entry(attempt.quiz_id.clone())
                .or_default()
                .push(index);
        }

        let mut quiz_stats = Vec::new();
        for (quiz_id, indexes) in grouped {
            let Some(quiz) = self.quiz_repository.find_by_id(&quiz_id).await? else {
                continue;
            };

            let group: Vec<_> = indexes.iter().map(|&i| &attempts[i]).collect();
            let best_score = group.iter().map(|a| a.score).fold(0.0, f64::max);
            let average_score =
                group.iter().map(|a| a.score).sum::<f64>() / group.len() as f64;

            quiz_stats.push(UserQuizStats {
                quiz_id,
                title: quiz.title,
                pass_mark_percent: quiz.pass_mark_percent,
                attempts: group.len(),
                best_score,
                average_score,
                total_time_spent: group.iter().map(|a| a.time_spent).sum(),
                last_completed_at: group.iter().filter_map(|a| a.completed_at).max(),
                passed: best_score >= quiz.pass_mark_percent,
            });
        }

        quiz_stats.sort_by(|a, b| {
            b.last_completed_at
                .cmp(&a.last_completed_at)
                .then_with(|| a.quiz_id.cmp(&b.quiz_id))
        });

        let passed_quizzes = quiz_stats.iter().filter(|s| s.passed).count();
        let average_score = if quiz_stats.is_empty() {
            0.0
        } else {
            quiz_stats.iter().map(|s| s.average_score).sum::<f64>() / quiz_stats.len() as f64
        };

        Ok(UserStats {
            total_quizzes_attempted: quiz_stats.len(),
            total_attempts: attempts.len(),
            passed_quizzes,
            average_score,
            quiz_stats,
        })
    }
}

fn average_difficulty(questions: &[Question]) -> Difficulty {
    if questions.is_empty() {
        return Difficulty::Medium;
    }

    let total: u32 = questions
        .iter()
        .map(|q| match q.difficulty {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        })
        .sum();
    let average = total as f64 / questions.len() as f64;

    if average < 1.5 {
        Difficulty::Easy
    } else if average < 2.5 {
        Difficulty::Medium
    } else {
        Difficulty::Hard
    }
}
