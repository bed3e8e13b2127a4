use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::attempt::{Attempt, AttemptStatus},
};

#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Inserts a new attempt. A uniqueness violation on
    /// (user_id, quiz_id, attempt_number) surfaces as `Conflict` so a lost
    /// start race stays retryable.
    async fn insert(&self, attempt: Attempt) -> AppResult<Attempt>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Attempt>>;
    async fn find_in_progress(&self, user_id: &str, quiz_id: &str)
        -> AppResult<Option<Attempt>>;
    /// Highest attempt number allocated so far for (user, quiz); 0 when none.
    async fn max_attempt_number(&self, user_id: &str, quiz_id: &str) -> AppResult<i16>;
    /// Persists changes to an attempt that is still in progress. Fails with
    /// `Conflict` if the stored attempt has already reached a terminal state,
    /// which makes submission single-shot.
    async fn update_in_progress(&self, attempt: Attempt) -> AppResult<Attempt>;
    async fn find_by_user(
        &self,
        user_id: &str,
        course_id: Option<&str>,
    ) -> AppResult<Vec<Attempt>>;
    async fn find_completed_by_quiz(&self, quiz_id: &str) -> AppResult<Vec<Attempt>>;
    async fn find_completed_by_user(
        &self,
        user_id: &str,
        quiz_id: Option<&str>,
    ) -> AppResult<Vec<Attempt>>;
}

pub struct MongoAttemptRepository {
    collection: Collection<Attempt>,
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref write_error)) if write_error.code == 11000
    )
}

impl MongoAttemptRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.collection("quiz_attempts");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quiz_attempts collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        // Guards monotonic, non-duplicate attempt numbering under
        // concurrent starts.
        let user_quiz_number_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "quiz_id": 1, "attempt_number": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_quiz_attempt_number_unique".to_string())
                    .build(),
            )
            .build();

        let user_course_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "course_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("user_course".to_string())
                    .build(),
            )
            .build();

        let quiz_status_index = IndexModel::builder()
            .keys(doc! { "quiz_id": 1, "status": 1 })
            .options(
                IndexOptions::builder()
                    .name("quiz_status".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(user_quiz_number_index).await?;
        self.collection.create_index(user_course_index).await?;
        self.collection.create_index(quiz_status_index).await?;

        Ok(())
    }
}

#[async_trait]
impl AttemptRepository for MongoAttemptRepository {
    async fn insert(&self, attempt: Attempt) -> AppResult<Attempt> {
        match self.collection.insert_one(&attempt).await {
            Ok(_) => Ok(attempt),
            Err(err) if is_duplicate_key(&err) => Err(AppError::Conflict(format!(
                "Attempt number {} already exists for user '{}' on quiz '{}'",
                attempt.attempt_number, attempt.user_id, attempt.quiz_id
            ))),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Attempt>> {
        let attempt = self.collection.find_one(doc! { "id": id }).await?;
        Ok(attempt)
    }

    async fn find_in_progress(
        &self,
        user_id: &str,
        quiz_id: &str,
    ) -> AppResult<Option<Attempt>> {
        let attempt = self
            .collection
            .find_one(doc! {
                "user_id": user_id,
                "quiz_id": quiz_id,
                "status": AttemptStatus::InProgress.as_str(),
            })
            .await?;
        Ok(attempt)
    }

    async fn max_attempt_number(&self, user_id: &str, quiz_id: &str) -> AppResult<i16> {
        let mut cursor = self
            .collection
            .find(doc! { "user_id": user_id, "quiz_id": quiz_id })
            .sort(doc! { "attempt_number": -1 })
            .limit(1)
            .await?;

        let latest: Option<Attempt> = cursor.try_next().await?;
        Ok(latest.map(|a| a.attempt_number).unwrap_or(0))
    }

    async fn update_in_progress(&self, attempt: Attempt) -> AppResult<Attempt> {
        let result = self
            .collection
            .replace_one(
                doc! {
                    "id": &attempt.id,
                    "status": AttemptStatus::InProgress.as_str(),
                },
                &attempt,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::Conflict(format!(
                "Attempt '{}' is no longer in progress",
                attempt.id
            )));
        }

        Ok(attempt)
    }

    async fn find_by_user(
        &self,
        user_id: &str,
        course_id: Option<&str>,
    ) -> AppResult<Vec<Attempt>> {
        let mut filter = doc! { "user_id": user_id };
        if let Some(cid) = course_id {
            filter.insert("course_id", cid);
        }

        let attempts = self
            .collection
            .find(filter)
            .sort(doc! { "started_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn find_completed_by_quiz(&self, quiz_id: &str) -> AppResult<Vec<Attempt>> {
        let attempts = self
            .collection
            .find(doc! {
                "quiz_id": quiz_id,
                "status": AttemptStatus::Completed.as_str(),
            })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn find_completed_by_user(
        &self,
        user_id: &str,
        quiz_id: Option<&str>,
    ) -> AppResult<Vec<Attempt>> {
        let mut filter = doc! {
            "user_id": user_id,
            "status": AttemptStatus::Completed.as_str(),
        };
        if let Some(qid) = quiz_id {
            filter.insert("quiz_id", qid);
        }

        let attempts = self
            .collection
            .find(filter)
            .sort(doc! { "completed_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }
}
