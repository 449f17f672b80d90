//! The remote services the launcher talks to.

use crate::{common::*, identity::CallerIdentity, request::CreateTrainingJobRequest};

/// A submitted training job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobHandle {
    pub job_name: String,
    pub job_arn: String,
}

/// The state of a training job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobDescription {
    pub job_name: String,
    pub job_arn: String,
    pub status: String,
    pub secondary_status: String,
    pub failure_reason: Option<String>,
    pub hyperparameters: IndexMap<String, String>,
}

#[async_trait]
pub trait TrainingService: Send + Sync {
    async fn create_training_job(&self, request: &CreateTrainingJobRequest) -> Result<JobHandle>;

    async fn describe_training_job(&self, job_name: &str) -> Result<JobDescription>;
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn caller_identity(&self) -> Result<CallerIdentity>;

    /// Looks up the ARN of the named IAM role, including its path.
    async fn role_arn(&self, role_name: &str) -> Result<String>;
}
