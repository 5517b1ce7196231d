//! Readiness probes for external collaborators.

use async_trait::async_trait;

use super::db::PostgresRepositories;
use super::error::InfraError;
use super::redis::RedisCacheStore;

#[async_trait]
pub trait HealthProbe: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(&self) -> Result<(), InfraError>;
}

#[async_trait]
impl HealthProbe for PostgresRepositories {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn check(&self) -> Result<(), InfraError> {
        self.health_check()
            .await
            .map_err(|err| InfraError::database(err.to_string()))
    }
}

#[async_trait]
impl HealthProbe for RedisCacheStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn check(&self) -> Result<(), InfraError> {
        self.ping()
            .await
            .map_err(|err| InfraError::cache(err.to_string()))
    }
}
