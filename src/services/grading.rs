use std::collections::{HashMap, HashSet};

use crate::models::domain::attempt::AttemptAnswer;
use crate::models::domain::question::{Question, QuestionType};
use crate::models::dto::request::AnswerInput;

#[derive(Debug, Clone, PartialEq)]
pub struct GradingOutcome {
    pub answers: Vec<AttemptAnswer>,
    pub points_earned: i32,
    pub total_points: i32,
    pub score: f64,
}

/// Grades submitted answers against the current question set. Deterministic
/// and free of side effects: identical inputs always produce identical
/// outcomes.
///
/// Answers referencing a question id that no longer exists are dropped
/// silently (the question may have been deleted since the attempt started);
/// questions with no submitted answer earn nothing but still count toward
/// the total.
pub fn grade(questions: &[Question], submitted: &[AnswerInput]) -> GradingOutcome {
    let question_map: HashMap<&str, &Question> =
        questions.iter().map(|q| (q.id.as_str(), q)).collect();
    let total_points: i32 = questions.iter().map(|q| q.points).sum();

    let mut points_earned = 0;
    let mut answers = Vec::new();

    for answer in submitted {
        let Some(question) = question_map.get(answer.question_id.as_str()) else {
            continue;
        };

        let (is_correct, points) = grade_question(question, &answer.selected_answers);
        points_earned += points;

        answers.push(AttemptAnswer {
            question_id: answer.question_id.clone(),
            selected_answers: answer.selected_answers.clone(),
            answer_text: answer.answer_text.clone(),
            is_correct,
            points_earned: points,
            time_spent: answer.time_spent,
        });
    }

    GradingOutcome {
        answers,
        points_earned,
        total_points,
        score: score_percent(points_earned, total_points),
    }
}

/// Grade an individual question based on type. Short answers are never
/// auto-graded; they keep `is_correct = None` and wait for manual review.
fn grade_question(question: &Question, selected: &[String]) -> (Option<bool>, i32) {
    match question.question_type {
        QuestionType::SingleChoice | QuestionType::MultipleChoice => {
            // Set equality against the correct options, not subset or
            // superset. No partial credit.
            let correct: HashSet<&str> = question
                .options
                .iter()
                .filter(|opt| opt.is_correct)
                .map(|opt| opt.id.as_str())
                .collect();
            let chosen: HashSet<&str> = selected.iter().map(|s| s.as_str()).collect();

            let is_correct = !correct.is_empty() && chosen == correct;
            (Some(is_correct), if is_correct { question.points } else { 0 })
        }
        QuestionType::TrueFalse => {
            let correct = question
                .options
                .iter()
                .find(|opt| opt.is_correct)
                .map(|opt| opt.id.as_str());

            let is_correct = selected.len() == 1 && correct == Some(selected[0].as_str());
            (Some(is_correct), if is_correct { question.points } else { 0 })
        }
        QuestionType::ShortAnswer => (None, 0),
    }
}

/// Percentage score rounded to 2 decimal places; 0 when nothing is gradable.
pub fn score_percent(points_earned: i32, total_points: i32) -> f64 {
    if total_points <= 0 {
        return 0.0;
    }

    let raw = points_earned as f64 / total_points as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}
