use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::domain::quiz::QuizStatus;
use crate::models::domain::Quiz;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AvailabilityError {
    #[error("This quiz is not available")]
    NotPublished,

    #[error("Quiz is not available yet")]
    NotYetAvailable,

    #[error("Quiz is no longer available")]
    NoLongerAvailable,
}

/// Checks publish status and the availability window against `now`.
/// Runs before an attempt starts and before quiz content is handed to a
/// learner.
pub fn check_available(quiz: &Quiz, now: DateTime<Utc>) -> Result<(), AvailabilityError> {
    if quiz.status != QuizStatus::Published {
        return Err(AvailabilityError::NotPublished);
    }

    if let Some(from) = quiz.available_from {
        if now < from {
            return Err(AvailabilityError::NotYetAvailable);
        }
    }

    if let Some(until) = quiz.available_until {
        if now > until {
            return Err(AvailabilityError::NoLongerAvailable);
        }
    }

    Ok(())
}
