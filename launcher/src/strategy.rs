//! Strategies turning a job specification into a request document.

use crate::{
    common::*,
    options::LaunchOptions,
    request::{
        AlgorithmSpecification, Channel, CheckpointConfig, CreateTrainingJobRequest, DataSource,
        OutputDataConfig, ResourceConfig, S3DataSource, ShuffleConfig, StoppingCondition,
    },
    spec::TrainingJobSpec,
};

/// The channel the training container reads its data from.
pub const TRAINING_CHANNEL: &str = "training";
pub const INPUT_MODE_FILE: &str = "File";
pub const S3_DATA_TYPE_PREFIX: &str = "S3Prefix";
pub const S3_DISTRIBUTION_FULLY_REPLICATED: &str = "FullyReplicated";
pub const COMPRESSION_NONE: &str = "None";
pub const RECORD_WRAPPER_NONE: &str = "None";

pub trait SubmitStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;
    fn build_request(&self, spec: &TrainingJobSpec) -> Result<CreateTrainingJobRequest>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum StrategyKind {
    Estimator,
    Direct,
}

impl StrategyKind {
    pub fn to_strategy(self, options: &LaunchOptions) -> Box<dyn SubmitStrategy> {
        match self {
            Self::Estimator => Box::new(EstimatorStrategy),
            Self::Direct => Box::new(DirectStrategy {
                shuffle_seed: options.shuffle_seed,
                network_isolation: options.network_isolation,
                traffic_encryption: options.traffic_encryption,
            }),
        }
    }
}

/// Submits the fields a high-level estimator surfaces. Everything else is
/// left to service defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatorStrategy;

impl SubmitStrategy for EstimatorStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Estimator
    }

    fn build_request(&self, spec: &TrainingJobSpec) -> Result<CreateTrainingJobRequest> {
        let channel = Channel {
            channel_name: TRAINING_CHANNEL.into(),
            data_source: DataSource {
                s3_data_source: S3DataSource {
                    s3_data_type: S3_DATA_TYPE_PREFIX.into(),
                    s3_uri: spec.input_location.clone(),
                    s3_data_distribution_type: None,
                },
            },
            compression_type: None,
            record_wrapper_type: None,
            input_mode: None,
            shuffle_config: None,
        };

        Ok(assemble_request(
            spec,
            StrategyFields {
                metrics_time_series: None,
                channel,
                s3_output_path: spec.output_location.clone(),
                network_isolation: None,
                traffic_encryption: None,
                managed_spot_training: spec.spot.as_ref().map(|_| true),
            },
        ))
    }
}

/// Submits the full request document.
#[derive(Debug, Clone, Copy, Derivative)]
#[derivative(Default)]
pub struct DirectStrategy {
    #[derivative(Default(value = "123"))]
    pub shuffle_seed: i64,
    pub network_isolation: bool,
    pub traffic_encryption: bool,
}

impl SubmitStrategy for DirectStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Direct
    }

    fn build_request(&self, spec: &TrainingJobSpec) -> Result<CreateTrainingJobRequest> {
        let channel = Channel {
            channel_name: TRAINING_CHANNEL.into(),
            data_source: DataSource {
                s3_data_source: S3DataSource {
                    s3_data_type: S3_DATA_TYPE_PREFIX.into(),
                    s3_uri: spec.input_location.clone(),
                    s3_data_distribution_type: Some(S3_DISTRIBUTION_FULLY_REPLICATED.into()),
                },
            },
            compression_type: Some(COMPRESSION_NONE.into()),
            record_wrapper_type: Some(RECORD_WRAPPER_NONE.into()),
            input_mode: Some(INPUT_MODE_FILE.into()),
            shuffle_config: Some(ShuffleConfig {
                seed: self.shuffle_seed,
            }),
        };

        let s3_output_path = if spec.output_location.ends_with('/') {
            spec.output_location.clone()
        } else {
            format!("{}/", spec.output_location)
        };

        Ok(assemble_request(
            spec,
            StrategyFields {
                metrics_time_series: Some(true),
                channel,
                s3_output_path,
                network_isolation: Some(self.network_isolation),
                traffic_encryption: Some(self.traffic_encryption),
                managed_spot_training: Some(spec.spot.is_some()),
            },
        ))
    }
}

/// The members that differ between strategies.
struct StrategyFields {
    metrics_time_series: Option<bool>,
    channel: Channel,
    s3_output_path: String,
    network_isolation: Option<bool>,
    traffic_encryption: Option<bool>,
    managed_spot_training: Option<bool>,
}

fn assemble_request(spec: &TrainingJobSpec, fields: StrategyFields) -> CreateTrainingJobRequest {
    let TrainingJobSpec {
        job_name,
        image,
        role,
        instance_type,
        instance_count,
        volume_size,
        max_run_time,
        hyperparameters,
        metric_definitions,
        input_location: _,
        output_location: _,
        spot,
    } = spec;
    let StrategyFields {
        metrics_time_series,
        channel,
        s3_output_path,
        network_isolation,
        traffic_encryption,
        managed_spot_training,
    } = fields;

    CreateTrainingJobRequest {
        training_job_name: job_name.clone(),
        hyper_parameters: hyperparameters.clone(),
        algorithm_specification: AlgorithmSpecification {
            training_image: image.clone(),
            training_input_mode: INPUT_MODE_FILE.into(),
            metric_definitions: metric_definitions.clone(),
            enable_sagemaker_metrics_time_series: metrics_time_series,
        },
        role_arn: role.clone(),
        input_data_config: vec![channel],
        output_data_config: OutputDataConfig { s3_output_path },
        resource_config: ResourceConfig {
            instance_type: instance_type.clone(),
            instance_count: *instance_count,
            volume_size_in_gb: *volume_size,
        },
        stopping_condition: StoppingCondition {
            max_runtime_in_seconds: *max_run_time,
            max_wait_time_in_seconds: spot.as_ref().map(|spot| spot.max_wait_time),
        },
        enable_network_isolation: network_isolation,
        enable_inter_container_traffic_encryption: traffic_encryption,
        enable_managed_spot_training: managed_spot_training,
        checkpoint_config: spot.as_ref().map(|spot| CheckpointConfig {
            s3_uri: spot.checkpoint_location.clone(),
        }),
    }
}
