//! dac-sim: replay governance action scripts against simulated tenants.

mod script;
mod world;

use anyhow::Context;
use clap::Parser;
use dac_runtime::{RuntimeConfig, TenantState};
use dac_types::DacId;
use dac_utils::{format_duration, init_logging, LogFormat};
use script::Script;
use std::path::PathBuf;
use world::SimWorld;

/// Default simulated clock: far enough past zero that the first election
/// period has elapsed.
const DEFAULT_START_TIME: u64 = 1_000_000;

#[derive(Parser)]
#[command(name = "dac-sim", about = "Replay DAC governance actions against simulated tenants")]
struct Cli {
    /// Path to the TOML runtime configuration (tenants, parameters, fixtures).
    #[arg(long, env = "DAC_CONFIG")]
    config: PathBuf,

    /// Log level, overriding the config file. `RUST_LOG` wins over both.
    #[arg(long, env = "DAC_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json", overriding the config file.
    #[arg(long, env = "DAC_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Validate the configuration and summarise each tenant.
    CheckConfig,
    /// Run an action script and print every outcome.
    Replay {
        /// JSON script file.
        script: PathBuf,

        /// Clock value at the start, overriding the script.
        #[arg(long, env = "DAC_START_TIME")]
        start_time: Option<u64>,

        /// Print each touched tenant's final state as JSON.
        #[arg(long)]
        print_state: bool,

        /// Keep going after an unexpected failure.
        #[arg(long)]
        keep_going: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = RuntimeConfig::from_toml_file(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    let format = cli.log_format.unwrap_or(config.log_format);
    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    init_logging(format, &level);
    tracing::info!(path = %cli.config.display(), tenants = config.tenants.len(), "config loaded");

    match cli.command {
        Command::CheckConfig => check_config(&config),
        Command::Replay {
            script,
            start_time,
            print_state,
            keep_going,
        } => {
            let script = Script::from_json_file(&script)?;
            replay(&config, &script, start_time, print_state, keep_going)
        }
    }
}

fn check_config(config: &RuntimeConfig) -> anyhow::Result<()> {
    for tenant in &config.tenants {
        let election = &tenant.election;
        println!("{} ({})", tenant.tenant.dac_id, tenant.tenant.title);
        println!("  owner:          {}", tenant.tenant.owner);
        println!("  token:          {}", tenant.tenant.symbol);
        println!(
            "  seats:          {} (max {} votes, tiers {}/{}/{})",
            election.numelected,
            election.maxvotes,
            election.auth_threshold_high,
            election.auth_threshold_mid,
            election.auth_threshold_low
        );
        println!("  period:         {}", format_duration(election.periodlength as u64));
        println!("  pending delay:  {}", format_duration(election.pending_period_delay as u64));
        println!("  pay cap:        {}", election.requested_pay_max);
        println!("  lockup:         {}", election.lockupasset);
        println!(
            "  proposals:      threshold {}, finalize {}, open for {}",
            tenant.proposals.proposal_threshold,
            tenant.proposals.finalize_threshold,
            format_duration(tenant.proposals.approval_duration as u64)
        );
        for (account_type, account) in &tenant.tenant.accounts {
            println!("  {:<15} {account}", account_type.to_string());
        }
    }
    println!("{} tenant(s) OK", config.tenants.len());
    Ok(())
}

fn replay(
    config: &RuntimeConfig,
    script: &Script,
    start_time: Option<u64>,
    print_state: bool,
    keep_going: bool,
) -> anyhow::Result<()> {
    let start = start_time.or(script.start_time).unwrap_or(DEFAULT_START_TIME);
    let world = SimWorld::from_config(config, start)?;
    let mut touched: Vec<DacId> = Vec::new();
    let mut unexpected = 0usize;

    for (index, step) in script.steps.iter().enumerate() {
        let dac_id = script.tenant_for(step)?;
        if !touched.contains(&dac_id) {
            touched.push(dac_id);
        }
        if step.advance > 0 {
            world.clock.advance(step.advance);
        }
        let name = step.action.name();
        match (world.runtime.execute(&dac_id, &step.auth, step.action.clone()), step.expect_error) {
            (Ok(report), None) => {
                println!("#{index:<3} {dac_id} {name}: ok {}", serde_json::to_string(&report.outcome)?);
                for message in &report.messages {
                    println!("       -> {}", serde_json::to_string(message)?);
                }
            }
            (Ok(_), Some(kind)) => {
                unexpected += 1;
                println!("#{index:<3} {dac_id} {name}: succeeded, expected {kind}");
            }
            (Err(e), Some(kind)) if e.kind() == kind => {
                println!("#{index:<3} {dac_id} {name}: rejected as expected ({kind}): {e}");
            }
            (Err(e), _) => {
                unexpected += 1;
                println!("#{index:<3} {dac_id} {name}: FAILED ({}): {e}", e.kind());
            }
        }
        if unexpected > 0 && !keep_going {
            break;
        }
    }

    println!(
        "{} message(s) delivered to the simulated chain",
        world.messages.received().len()
    );
    for tenant in &config.tenants {
        for holding in &tenant.fixtures.balances {
            let balance = world.tokens.balance(
                holding.account,
                holding.quantity.contract,
                holding.quantity.quantity.symbol,
            );
            println!("  {} holds {balance}", holding.account);
        }
    }
    if print_state {
        for dac_id in &touched {
            let state: TenantState = world.runtime.state(dac_id)?;
            println!("{dac_id}: {}", serde_json::to_string_pretty(&state)?);
        }
    }

    if unexpected > 0 {
        anyhow::bail!("{unexpected} step(s) did not behave as scripted");
    }
    Ok(())
}
