// SPDX-License-Identifier: PolyForm-Shield-1.0

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use serving::RuntimeManager;

#[derive(Parser)]
#[command(name = "axon", version, about = "axon model-serving adapter node")]
struct Cli {
    /// path to a TOML deployment manifest (applies to all subcommands)
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// run a serving node: deploy every manifest entry and serve until interrupted
    Serve(ServeOpts),

    /// print a deployed model's metadata as json
    Metadata(MetadataOpts),

    /// run one inference against a deployed model and print the typed output
    Infer(InferOpts),
}

#[derive(Parser, Debug)]
struct ServeOpts {
    /// optional node identity / label for operator
    #[arg(long)]
    node_id: Option<String>,

    /// override directory for persisted node state
    #[arg(long)]
    state_root: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct MetadataOpts {
    /// model name as listed in the manifest
    #[arg(long)]
    model: String,

    /// model version label
    #[arg(long, default_value = "1")]
    version: String,
}

#[derive(Parser, Debug)]
struct InferOpts {
    /// model name as listed in the manifest
    #[arg(long)]
    model: String,

    /// model version label
    #[arg(long, default_value = "1")]
    version: String,

    /// text element for the first input tensor (repeatable)
    #[arg(long = "input")]
    inputs: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    util::logging::init_tracing();

    let cli = Cli::parse();
    info!("starting axon: {:?}", cli.command);

    match cli.command {
        Commands::Serve(opts) => {
            serving::run(serving::Config {
                manifest: cli.config,
                state_root: opts.state_root,
                node_id: opts.node_id,
            })
            .await?;
        }
        Commands::Metadata(opts) => {
            let runtime = runtime_from_manifest(cli.config.as_deref()).await?;
            let metadata = runtime.model_metadata(&opts.model, &opts.version).await?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        Commands::Infer(opts) => {
            if opts.inputs.is_empty() {
                bail!("at least one --input element is required");
            }
            let runtime = runtime_from_manifest(cli.config.as_deref()).await?;

            let metadata = runtime.model_metadata(&opts.model, &opts.version).await?;
            let task = runtime.model_task(&opts.model).await?;

            let elements: Vec<&[u8]> = opts.inputs.iter().map(|s| s.as_bytes()).collect();
            let raw = protocol::tensor::serialize_bytes_tensor(&elements)?;

            let req = protocol::ModelInferRequest {
                model_name: opts.model.clone(),
                model_version: opts.version.clone(),
                inputs: metadata.inputs.first().cloned().into_iter().collect(),
                raw_input_contents: vec![raw],
            };

            let resp = runtime.model_infer(req).await?;
            let output = model_runtime::output::post_process(&resp, &metadata, task)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// build an in-process runtime with every manifest model deployed.
async fn runtime_from_manifest(path: Option<&str>) -> Result<RuntimeManager> {
    let path = path.context("--config manifest is required for this command")?;
    let manifest = config::load_from_file(path)?;

    let runtime = RuntimeManager::new();
    for model in &manifest.models {
        runtime
            .deploy_model(&model.name, &model.version, model.task)
            .await?;
    }
    Ok(runtime)
}
