use crate::{
    common::*,
    identity::resolve_role_arn,
    options::LaunchOptions,
    request::CreateTrainingJobRequest,
    service::{IdentityProvider, JobDescription, JobHandle, TrainingService},
    spec::{JobDraft, TrainingJobSpec},
    strategy::SubmitStrategy,
};

/// Builds the job specification from the options.
///
/// Local files are loaded and checked first. The caller identity is only
/// queried when the image or the role is not given, and its role is only
/// looked up when the role is not given.
pub async fn prepare_spec<I>(options: &LaunchOptions, identity: &I) -> Result<TrainingJobSpec>
where
    I: IdentityProvider + ?Sized,
{
    let draft = JobDraft::load(options)?;

    let caller = if draft.needs_identity() {
        let caller = identity.caller_identity().await?;
        debug!("resolved caller identity '{}'", caller.arn);
        Some(caller)
    } else {
        None
    };

    let caller_role = match &caller {
        Some(caller) if draft.needs_role() => Some(resolve_role_arn(caller, identity).await?),
        _ => None,
    };

    draft.finish(caller.as_ref(), caller_role)
}

/// Builds the request document that would be submitted.
pub async fn prepare_request<I>(
    options: &LaunchOptions,
    identity: &I,
) -> Result<CreateTrainingJobRequest>
where
    I: IdentityProvider + ?Sized,
{
    let spec = prepare_spec(options, identity).await?;
    options.strategy.to_strategy(options).build_request(&spec)
}

/// Submits a job specification without waiting for the job.
pub async fn submit_spec<S>(
    spec: &TrainingJobSpec,
    strategy: &dyn SubmitStrategy,
    service: &S,
) -> Result<JobHandle>
where
    S: TrainingService + ?Sized,
{
    let request = strategy.build_request(spec)?;
    info!(
        "submit training job '{}' with {} strategy",
        request.training_job_name,
        strategy.kind()
    );
    let handle = service.create_training_job(&request).await?;
    info!("job launched: {}", handle.job_arn);
    Ok(handle)
}

/// Submits a training job built from the options.
pub async fn submit<S, I>(options: &LaunchOptions, service: &S, identity: &I) -> Result<JobHandle>
where
    S: TrainingService + ?Sized,
    I: IdentityProvider + ?Sized,
{
    let spec = prepare_spec(options, identity).await?;
    let strategy = options.strategy.to_strategy(options);
    submit_spec(&spec, strategy.as_ref(), service).await
}

/// Queries the state of a training job.
pub async fn describe<S>(job_name: &str, service: &S) -> Result<JobDescription>
where
    S: TrainingService + ?Sized,
{
    ensure!(!job_name.is_empty(), "the job name must not be empty");
    service.describe_training_job(job_name).await
}
