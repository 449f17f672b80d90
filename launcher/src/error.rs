use std::path::PathBuf;

/// Invalid local configuration detected before any remote call.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("--bucket is required")]
    MissingBucket,
    #[error("--hyperparam-path is required")]
    MissingHyperparameterPath,
    #[error("hyperparameters file '{0}' does not exist")]
    HyperparameterFileNotFound(PathBuf),
    #[error("--max-wait-time is required with --use-spot")]
    MissingMaxWaitTime,
    #[error("cannot derive an execution role from identity '{0}', please set --role")]
    UnsupportedIdentity(String),
}
