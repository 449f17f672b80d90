use anyhow::Result;
use d2_launcher::{
    aws::{self, AwsIdentity, SageMakerService},
    service::JobDescription,
    LaunchOptions,
};
use prettytable::{cell, row, Table};
use structopt::StructOpt;

#[derive(Debug, Clone, StructOpt)]
/// Launch Detectron2 training jobs on SageMaker.
enum Args {
    /// Submit a training job without waiting for it.
    Run {
        #[structopt(long)]
        /// print the request document instead of submitting it
        dry_run: bool,
        #[structopt(flatten)]
        options: LaunchOptions,
    },
    /// Print the status of a training job.
    Check {
        #[structopt(long, default_value = "d2-coco-train")]
        job_name: String,
        #[structopt(long, default_value = "us-east-1")]
        region: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();

    match Args::from_args() {
        Args::Run { dry_run, options } => run(options, dry_run).await?,
        Args::Check { job_name, region } => check(&job_name, &region).await?,
    }

    Ok(())
}

async fn run(options: LaunchOptions, dry_run: bool) -> Result<()> {
    let config = aws::load_sdk_config(&options.region).await;
    let identity = AwsIdentity::new(&config);

    if dry_run {
        let request = d2_launcher::prepare_request(&options, &identity).await?;
        println!("{}", serde_json::to_string_pretty(&request)?);
    } else {
        let service = SageMakerService::new(&config);
        let handle = d2_launcher::submit(&options, &service, &identity).await?;
        println!("Job launched: {}", handle.job_arn);
    }

    Ok(())
}

async fn check(job_name: &str, region: &str) -> Result<()> {
    let config = aws::load_sdk_config(region).await;
    let service = SageMakerService::new(&config);
    let description = d2_launcher::describe(job_name, &service).await?;
    print_description(&description);
    Ok(())
}

fn print_description(description: &JobDescription) {
    let JobDescription {
        job_name,
        job_arn,
        status,
        secondary_status,
        failure_reason,
        hyperparameters,
    } = description;

    println!("Job name: {}", job_name);
    println!("Job ARN: {}", job_arn);
    println!("Job status: {} ({})", status, secondary_status);
    if let Some(reason) = failure_reason {
        println!("Failure reason: {}", reason);
    }

    let mut table = Table::new();
    table.add_row(row!["hyperparameter", "value"]);
    hyperparameters.iter().for_each(|(key, value)| {
        table.add_row(row![key, value]);
    });
    table.printstd();
}
