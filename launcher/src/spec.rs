//! Training job specification.

use crate::{
    common::*,
    error::LaunchError,
    identity::CallerIdentity,
    job_files::{self, MetricDefinition, CONFIG_FILE_HYPERPARAMETER},
    options::LaunchOptions,
};

/// A training job independent of the submission strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainingJobSpec {
    pub job_name: String,
    pub image: String,
    pub role: String,
    pub instance_type: String,
    pub instance_count: i32,
    /// EBS volume size in GB.
    pub volume_size: i32,
    /// Maximum training time in seconds.
    pub max_run_time: i32,
    pub hyperparameters: IndexMap<String, String>,
    pub metric_definitions: Vec<MetricDefinition>,
    pub input_location: String,
    pub output_location: String,
    pub spot: Option<SpotPolicy>,
}

/// Managed spot training settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpotPolicy {
    /// Maximum time in seconds to wait for capacity plus training.
    pub max_wait_time: i32,
    pub checkpoint_location: String,
}

/// A job specification with local files loaded and checked, waiting for the
/// image and role defaults.
#[derive(Debug, Clone)]
pub struct JobDraft {
    job_name: String,
    image: Option<String>,
    role: Option<String>,
    region: String,
    instance_type: String,
    instance_count: i32,
    volume_size: i32,
    max_run_time: i32,
    hyperparameters: IndexMap<String, String>,
    metric_definitions: Vec<MetricDefinition>,
    input_location: String,
    output_location: String,
    spot: Option<SpotPolicy>,
}

impl JobDraft {
    /// Checks the options and loads the job files. It never contacts the
    /// remote service.
    pub fn load(options: &LaunchOptions) -> Result<Self> {
        let LaunchOptions {
            ref bucket,
            ref hyperparam_path,
            ref metric_path,
            ref image_name,
            ref role,
            ref region,
            ref prefix_output,
            ref data_prefix,
            ref job_name,
            instance_count,
            ref instance_type,
            volume_size,
            use_spot,
            max_run_time,
            max_wait_time,
            ref d2_config,
            ..
        } = *options;

        let bucket = bucket
            .as_deref()
            .filter(|bucket| !bucket.is_empty())
            .ok_or(LaunchError::MissingBucket)?;
        let hyperparam_path = hyperparam_path
            .as_ref()
            .ok_or(LaunchError::MissingHyperparameterPath)?;
        if !hyperparam_path.is_file() {
            return Err(LaunchError::HyperparameterFileNotFound(hyperparam_path.clone()).into());
        }

        ensure!(!job_name.is_empty(), "the job name must not be empty");
        ensure!(
            instance_count >= 1,
            "--instance-count must be positive, but get {}",
            instance_count
        );
        ensure!(
            volume_size >= 1,
            "--volume-size must be positive, but get {}",
            volume_size
        );
        ensure!(
            max_run_time >= 1,
            "--max-run-time must be positive, but get {}",
            max_run_time
        );

        let spot = if use_spot {
            let max_wait_time = max_wait_time.ok_or(LaunchError::MissingMaxWaitTime)?;
            ensure!(
                max_wait_time >= max_run_time,
                "--max-wait-time ({}) must not be less than --max-run-time ({})",
                max_wait_time,
                max_run_time
            );
            Some(SpotPolicy {
                max_wait_time,
                checkpoint_location: format!("s3://{}/", bucket),
            })
        } else {
            if max_wait_time.is_some() {
                warn!("--max-wait-time is ignored without --use-spot");
            }
            None
        };

        let mut hyperparameters = job_files::load_hyperparameters(hyperparam_path)?;
        if let Some(d2_config) = d2_config {
            if let Some(prev) =
                hyperparameters.insert(CONFIG_FILE_HYPERPARAMETER.to_owned(), d2_config.clone())
            {
                info!(
                    "override hyperparameter '{}' from '{}' to '{}'",
                    CONFIG_FILE_HYPERPARAMETER, prev, d2_config
                );
            }
        }

        let metric_definitions = match metric_path {
            Some(path) => job_files::load_metric_definitions(path)?,
            None => job_files::default_metric_definitions(),
        };

        Ok(Self {
            job_name: job_name.clone(),
            image: image_name.clone(),
            role: role.clone(),
            region: region.clone(),
            instance_type: instance_type.clone(),
            instance_count,
            volume_size,
            max_run_time,
            hyperparameters,
            metric_definitions,
            input_location: format!("s3://{}/{}", bucket, data_prefix),
            output_location: format!("s3://{}/{}", bucket, prefix_output),
            spot,
        })
    }

    /// Whether the caller identity is needed to fill in defaults.
    pub fn needs_identity(&self) -> bool {
        self.image.is_none() || self.role.is_none()
    }

    /// Whether the role must be derived from the caller identity.
    pub fn needs_role(&self) -> bool {
        self.role.is_none()
    }

    /// Fills in the image default from the caller identity and the role
    /// default from the resolved caller role.
    pub fn finish(
        self,
        identity: Option<&CallerIdentity>,
        caller_role: Option<String>,
    ) -> Result<TrainingJobSpec> {
        let Self {
            job_name,
            image,
            role,
            region,
            instance_type,
            instance_count,
            volume_size,
            max_run_time,
            hyperparameters,
            metric_definitions,
            input_location,
            output_location,
            spot,
        } = self;

        let image = match image {
            Some(image) => image,
            None => identity
                .ok_or_else(|| format_err!("the caller identity is required for the default image"))?
                .default_image(&region),
        };
        let role = match role {
            Some(role) => role,
            None => caller_role
                .ok_or_else(|| format_err!("the caller role is required for the default role"))?,
        };

        Ok(TrainingJobSpec {
            job_name,
            image,
            role,
            instance_type,
            instance_count,
            volume_size,
            max_run_time,
            hyperparameters,
            metric_definitions,
            input_location,
            output_location,
            spot,
        })
    }
}
