use std::{fs, path::PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use bundler_common::{
    compute_authwit_nullifier, compute_inner_hash, Address, Field, Nullifier, Visibility,
};
use bundler_contract::ExecuteMsg;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod scenario;

use config::{OutputFormat, ToolsConfig};
use scenario::{run_scenario, Scenario};

#[derive(Parser)]
#[command(
    name = "bundler-tools",
    about = "Utility commands for the token bundler sandbox"
)]
struct Cli {
    /// Log filter, overrides BUNDLER_LOG.
    #[arg(long, global = true)]
    log: Option<String>,
    /// Output format, overrides BUNDLER_OUTPUT.
    #[arg(long, global = true, value_enum)]
    output: Option<OutputFormat>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON scenario against a fresh sandbox and print the report.
    Run(RunArgs),
    /// Print the witness inner hash and nullifier for a delegated message.
    InnerHash(InnerHashArgs),
}

#[derive(Args)]
struct RunArgs {
    #[arg(long)]
    scenario: PathBuf,
}

#[derive(Args)]
struct InnerHashArgs {
    /// Party that will submit the message.
    #[arg(long)]
    caller: Address,
    /// Party whose funds the message pulls.
    #[arg(long)]
    authorizer: Address,
    /// Execute message as inline JSON.
    #[arg(long, conflicts_with = "msg_file")]
    msg: Option<String>,
    #[arg(long)]
    msg_file: Option<PathBuf>,
    /// Deployment address, overrides BUNDLER_CONTRACT_ADDRESS.
    #[arg(long)]
    contract: Option<Address>,
}

#[derive(Serialize)]
struct InnerHashReport {
    entry_point: &'static str,
    visibility: Visibility,
    contract: Address,
    caller: Address,
    authorizer: Address,
    inner_hash: Field,
    nullifier: Nullifier,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ToolsConfig::from_env()?.with_overrides(cli.log, cli.output);
    init_tracing(&config)?;

    match cli.command {
        Commands::Run(args) => run(args, &config),
        Commands::InnerHash(args) => inner_hash(args, &config),
    }
}

fn init_tracing(config: &ToolsConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_filter)
        .with_context(|| format!("invalid log filter '{}'", config.log_filter))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}

fn run(args: RunArgs, config: &ToolsConfig) -> Result<()> {
    let scenario = Scenario::from_json_file(&args.scenario)?;
    info!(
        path = %args.scenario.display(),
        steps = scenario.steps.len(),
        "running scenario"
    );

    let report = run_scenario(&scenario)?;
    println!("{}", config.output.render(&report)?);

    if !report.all_expectations_met() {
        let failed: Vec<usize> = report
            .steps
            .iter()
            .filter(|step| !step.expectation_met)
            .map(|step| step.index)
            .collect();
        bail!("steps {failed:?} did not meet their expectation");
    }
    Ok(())
}

fn inner_hash(args: InnerHashArgs, config: &ToolsConfig) -> Result<()> {
    let raw = match (args.msg, &args.msg_file) {
        (Some(inline), _) => inline,
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => bail!("either --msg or --msg-file is required"),
    };
    let msg: ExecuteMsg = serde_json::from_str(&raw).context("failed to parse execute message")?;
    let (visibility, action) = msg
        .authwit_action()
        .ok_or_else(|| anyhow!("{} cannot be executed on another party's behalf", msg.entry_point()))?;

    let contract = args.contract.unwrap_or(config.contract_address);
    let inner_hash = compute_inner_hash(&contract, &args.caller, &action);
    let report = InnerHashReport {
        entry_point: msg.entry_point(),
        visibility,
        contract,
        caller: args.caller,
        authorizer: args.authorizer,
        inner_hash,
        nullifier: compute_authwit_nullifier(&args.authorizer, &inner_hash),
    };

    println!("{}", config.output.render(&report)?);
    Ok(())
}
