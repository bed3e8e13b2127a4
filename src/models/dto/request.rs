use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StartAttemptInput {
    #[validate(length(min = 1, message = "quiz_id must not be empty"))]
    pub quiz_id: String,
}

/// One answer as the learner submits or autosaves it. Choice questions fill
/// `selected_answers`, short-answer questions fill `answer_text`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AnswerInput {
    #[validate(length(min = 1, message = "question_id must not be empty"))]
    pub question_id: String,

    #[serde(default)]
    pub selected_answers: Vec<String>,

    pub answer_text: Option<String>,

    #[serde(default)]
    #[validate(range(min = 0, message = "time_spent must not be negative"))]
    pub time_spent: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAttemptInput {
    #[validate(nested)]
    pub answers: Vec<AnswerInput>,
}
