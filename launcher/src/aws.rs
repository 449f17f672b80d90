//! SageMaker, STS and IAM clients.

use crate::{
    common::*,
    identity::CallerIdentity,
    request::{self, CreateTrainingJobRequest},
    service::{IdentityProvider, JobDescription, JobHandle, TrainingService},
};
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_sagemaker::{config::Region, types as sm};

/// Loads credentials and settings from the environment for `region`.
pub async fn load_sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_owned()))
        .load()
        .await
}

#[derive(Debug, Clone)]
pub struct SageMakerService {
    client: aws_sdk_sagemaker::Client,
}

impl SageMakerService {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_sagemaker::Client::new(config),
        }
    }
}

#[async_trait]
impl TrainingService for SageMakerService {
    async fn create_training_job(&self, request: &CreateTrainingJobRequest) -> Result<JobHandle> {
        let CreateTrainingJobRequest {
            training_job_name,
            hyper_parameters,
            algorithm_specification,
            role_arn,
            input_data_config,
            output_data_config,
            resource_config,
            stopping_condition,
            enable_network_isolation,
            enable_inter_container_traffic_encryption,
            enable_managed_spot_training,
            checkpoint_config,
        } = request;

        let input_data_config: Vec<_> = input_data_config.iter().map(to_channel).try_collect()?;
        let checkpoint_config = checkpoint_config
            .as_ref()
            .map(|config| sm::CheckpointConfig::builder().s3_uri(&config.s3_uri).build())
            .transpose()?;

        let output = self
            .client
            .create_training_job()
            .training_job_name(training_job_name)
            .set_hyper_parameters(Some(
                hyper_parameters
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            ))
            .algorithm_specification(to_algorithm_specification(algorithm_specification)?)
            .role_arn(role_arn)
            .set_input_data_config(Some(input_data_config))
            .output_data_config(
                sm::OutputDataConfig::builder()
                    .s3_output_path(&output_data_config.s3_output_path)
                    .build()?,
            )
            .resource_config(
                sm::ResourceConfig::builder()
                    .instance_type(sm::TrainingInstanceType::from(
                        resource_config.instance_type.as_str(),
                    ))
                    .instance_count(resource_config.instance_count)
                    .volume_size_in_gb(resource_config.volume_size_in_gb)
                    .build()?,
            )
            .stopping_condition(
                sm::StoppingCondition::builder()
                    .max_runtime_in_seconds(stopping_condition.max_runtime_in_seconds)
                    .set_max_wait_time_in_seconds(stopping_condition.max_wait_time_in_seconds)
                    .build(),
            )
            .set_enable_network_isolation(*enable_network_isolation)
            .set_enable_inter_container_traffic_encryption(
                *enable_inter_container_traffic_encryption,
            )
            .set_enable_managed_spot_training(*enable_managed_spot_training)
            .set_checkpoint_config(checkpoint_config)
            .send()
            .await
            .with_context(|| format!("failed to create training job '{}'", training_job_name))?;

        Ok(JobHandle {
            job_name: training_job_name.clone(),
            job_arn: output.training_job_arn().to_owned(),
        })
    }

    async fn describe_training_job(&self, job_name: &str) -> Result<JobDescription> {
        let output = self
            .client
            .describe_training_job()
            .training_job_name(job_name)
            .send()
            .await
            .with_context(|| format!("failed to describe training job '{}'", job_name))?;

        let hyperparameters: IndexMap<_, _> = output
            .hyper_parameters()
            .into_iter()
            .flatten()
            .map(|(key, value)| (key.clone(), value.clone()))
            .sorted()
            .collect();

        Ok(JobDescription {
            job_name: job_name.to_owned(),
            job_arn: output.training_job_arn().to_owned(),
            status: output.training_job_status().as_str().to_owned(),
            secondary_status: output.secondary_status().as_str().to_owned(),
            failure_reason: output.failure_reason().map(ToOwned::to_owned),
            hyperparameters,
        })
    }
}

fn to_algorithm_specification(
    spec: &request::AlgorithmSpecification,
) -> Result<sm::AlgorithmSpecification> {
    let metric_definitions: Vec<_> = spec
        .metric_definitions
        .iter()
        .map(|metric| {
            sm::MetricDefinition::builder()
                .name(&metric.name)
                .regex(&metric.regex)
                .build()
        })
        .try_collect()?;

    let spec = sm::AlgorithmSpecification::builder()
        .training_image(&spec.training_image)
        .training_input_mode(sm::TrainingInputMode::from(
            spec.training_input_mode.as_str(),
        ))
        .set_metric_definitions(Some(metric_definitions))
        .set_enable_sage_maker_metrics_time_series(spec.enable_sagemaker_metrics_time_series)
        .build()?;
    Ok(spec)
}

fn to_channel(channel: &request::Channel) -> Result<sm::Channel> {
    let request::Channel {
        channel_name,
        data_source,
        compression_type,
        record_wrapper_type,
        input_mode,
        shuffle_config,
    } = channel;
    let s3 = &data_source.s3_data_source;

    let s3_data_source = sm::S3DataSource::builder()
        .s3_data_type(sm::S3DataType::from(s3.s3_data_type.as_str()))
        .s3_uri(&s3.s3_uri)
        .set_s3_data_distribution_type(
            s3.s3_data_distribution_type
                .as_deref()
                .map(sm::S3DataDistribution::from),
        )
        .build()?;
    let shuffle_config = shuffle_config
        .as_ref()
        .map(|config| sm::ShuffleConfig::builder().seed(config.seed).build())
        .transpose()?;

    let channel = sm::Channel::builder()
        .channel_name(channel_name)
        .data_source(
            sm::DataSource::builder()
                .s3_data_source(s3_data_source)
                .build(),
        )
        .set_compression_type(compression_type.as_deref().map(sm::CompressionType::from))
        .set_record_wrapper_type(record_wrapper_type.as_deref().map(sm::RecordWrapper::from))
        .set_input_mode(input_mode.as_deref().map(sm::TrainingInputMode::from))
        .set_shuffle_config(shuffle_config)
        .build()?;
    Ok(channel)
}

/// Queries the caller from STS and its role from IAM.
#[derive(Debug, Clone)]
pub struct AwsIdentity {
    sts: aws_sdk_sts::Client,
    iam: aws_sdk_iam::Client,
}

impl AwsIdentity {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            sts: aws_sdk_sts::Client::new(config),
            iam: aws_sdk_iam::Client::new(config),
        }
    }
}

#[async_trait]
impl IdentityProvider for AwsIdentity {
    async fn caller_identity(&self) -> Result<CallerIdentity> {
        let output = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .context("failed to get the caller identity")?;
        let account = output
            .account()
            .ok_or_else(|| format_err!("the caller identity has no account"))?;
        let arn = output
            .arn()
            .ok_or_else(|| format_err!("the caller identity has no ARN"))?;

        Ok(CallerIdentity {
            account: account.to_owned(),
            arn: arn.to_owned(),
        })
    }

    async fn role_arn(&self, role_name: &str) -> Result<String> {
        let output = self
            .iam
            .get_role()
            .role_name(role_name)
            .send()
            .await
            .with_context(|| format!("failed to get the role '{}'", role_name))?;
        let role = output
            .role()
            .ok_or_else(|| format_err!("the role '{}' is not returned", role_name))?;
        Ok(role.arn().to_owned())
    }
}
