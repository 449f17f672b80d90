use crate::{common::*, strategy::StrategyKind};
use structopt::StructOpt;

/// Options of a training job submission.
#[derive(Debug, Clone, StructOpt)]
pub struct LaunchOptions {
    #[structopt(long, default_value = "estimator")]
    /// submission strategy, "estimator" or "direct"
    pub strategy: StrategyKind,
    #[structopt(long)]
    /// S3 bucket for training data and results
    pub bucket: Option<String>,
    #[structopt(long)]
    /// JSON file of hyperparameters
    pub hyperparam_path: Option<PathBuf>,
    #[structopt(long)]
    /// newline-delimited JSON file of metric definitions
    pub metric_path: Option<PathBuf>,
    #[structopt(long)]
    /// training container image, defaults to the d2-sm-coco image in the caller's registry
    pub image_name: Option<String>,
    #[structopt(long)]
    /// execution role ARN, defaults to the caller's role
    pub role: Option<String>,
    #[structopt(long, default_value = "us-east-1")]
    pub region: String,
    #[structopt(long, default_value = "detectron2-output")]
    /// S3 prefix for the model artifacts
    pub prefix_output: String,
    #[structopt(long, default_value = "train-coco")]
    /// S3 prefix of the training data
    pub data_prefix: String,
    #[structopt(long, default_value = "d2-coco-train")]
    pub job_name: String,
    #[structopt(long, default_value = "2")]
    pub instance_count: i32,
    #[structopt(long, default_value = "ml.p3.16xlarge")]
    pub instance_type: String,
    #[structopt(long, default_value = "100")]
    /// EBS volume size in GB
    pub volume_size: i32,
    #[structopt(long)]
    /// train on managed spot instances
    pub use_spot: bool,
    #[structopt(long, default_value = "80000")]
    /// maximum training time in seconds
    pub max_run_time: i32,
    #[structopt(long)]
    /// maximum time in seconds to wait for spot capacity plus training, required with --use-spot
    pub max_wait_time: Option<i32>,
    #[structopt(long)]
    /// Detectron2 config file, overrides the "config-file" hyperparameter
    pub d2_config: Option<String>,
    #[structopt(long, default_value = "123")]
    /// shuffle seed of the training channel (direct strategy)
    pub shuffle_seed: i64,
    #[structopt(long)]
    /// isolate the training container from the network (direct strategy)
    pub network_isolation: bool,
    #[structopt(long)]
    /// encrypt traffic between training instances (direct strategy)
    pub traffic_encryption: bool,
}
