use std::sync::Arc;

use crate::{
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{MongoAttemptRepository, MongoQuestionRepository, MongoQuizRepository},
    services::{attempt_service::AttemptService, stats_service::StatsService},
};

/// Wires repositories and services against a live database connection.
/// The embedding API layer holds one of these per process.
#[derive(Clone)]
pub struct Engine {
    pub attempt_service: Arc<AttemptService>,
    pub stats_service: Arc<StatsService>,
    pub config: Arc<Config>,
}

impl Engine {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let quiz_repository = Arc::new(MongoQuizRepository::new(&db));
        quiz_repository.ensure_indexes().await?;

        let question_repository = Arc::new(MongoQuestionRepository::new(&db));
        question_repository.ensure_indexes().await?;

        let attempt_repository = Arc::new(MongoAttemptRepository::new(&db));
        attempt_repository.ensure_indexes().await?;

        let attempt_service = Arc::new(AttemptService::new(
            quiz_repository.clone(),
            question_repository.clone(),
            attempt_repository.clone(),
        ));
        let stats_service = Arc::new(StatsService::new(
            quiz_repository,
            question_repository,
            attempt_repository,
        ));

        Ok(Self {
            attempt_service,
            stats_service,
            config: Arc::new(config),
        })
    }
}
