//! bandit-sim: run decentralized multi-armed bandit simulations from the
//! command line and print reward/regret series.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use bandit_simulator_core_rs::{Orchestrator, PolicyConfig, RegretReport, SimulationConfig};
use clap::{Args, Parser, Subcommand, ValueEnum};
use config::{Config, Environment, File, FileFormat};
use tracing::{info, info_span, warn};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "bandit-sim")]
#[command(about = "Decentralized multi-armed bandit simulator (rho_rand collision avoidance)")]
#[command(version)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "BANDIT_SIM__LOG_JSON", default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a simulation from round 0 to the horizon
    Run {
        #[command(flatten)]
        overrides: ConfigOverrides,

        /// Output format for the reward series
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,

        /// Write the final checkpoint JSON to this file
        #[arg(long)]
        save_state: Option<PathBuf>,
    },

    /// Resume a run from a checkpoint written by `run --save-state`
    Resume {
        #[command(flatten)]
        overrides: ConfigOverrides,

        /// Checkpoint file
        #[arg(long)]
        state: PathBuf,

        /// Play at most this many rounds (default: until the horizon)
        #[arg(long)]
        rounds: Option<usize>,

        /// Output format for the reward series
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,

        /// Write the checkpoint reached after this resume to this file
        #[arg(long)]
        save_state: Option<PathBuf>,
    },
}

/// Config file plus per-field flags layered on top of it
///
/// Config fields can also be set through `BANDIT_SIM__<FIELD>` environment
/// variables (e.g. `BANDIT_SIM__ARM_MEANS=0.2,0.5,0.9`), which sit between
/// the file and the flags.
#[derive(Args, Debug, Default)]
struct ConfigOverrides {
    /// JSON config file (missing fields fall back to defaults)
    #[arg(short, long, env = "BANDIT_SIM__CONFIG")]
    config: Option<PathBuf>,

    /// Number of users (overrides config)
    #[arg(long)]
    users: Option<usize>,

    /// Number of arms (overrides config; defaults to the number of means)
    #[arg(long)]
    arms: Option<usize>,

    /// Number of rounds (overrides config)
    #[arg(long)]
    horizon: Option<usize>,

    /// Comma-separated arm means, each in (0, 1) (overrides config)
    #[arg(long, value_delimiter = ',')]
    means: Option<Vec<f64>>,

    /// RNG seed (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Arm index policy: ucb or ts (overrides config)
    #[arg(long)]
    policy: Option<PolicyConfig>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// `round,reward,cumulative_regret` rows
    Csv,
    /// Full regret report
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let run_id = Uuid::new_v4();
    let span = info_span!("bandit_sim", %run_id);
    let _guard = span.enter();

    match cli.command {
        Commands::Run {
            overrides,
            format,
            save_state,
        } => {
            let config = overrides.resolve()?;
            let mut orchestrator = Orchestrator::new(config.clone())?;
            orchestrator.run()?;

            if let Some(path) = save_state {
                write_checkpoint(&orchestrator, &path)?;
            }
            print_report(&config, orchestrator.round_rewards(), format)?;
        }
        Commands::Resume {
            overrides,
            state,
            rounds,
            format,
            save_state,
        } => {
            let config = overrides.resolve()?;
            let state_json = fs::read_to_string(&state)
                .with_context(|| format!("reading checkpoint {}", state.display()))?;
            let mut orchestrator = Orchestrator::load_state(config.clone(), &state_json)?;

            let start = orchestrator.current_round();
            let remaining = orchestrator.horizon() - start;
            let to_play = rounds.map_or(remaining, |n| n.min(remaining));
            if to_play == 0 {
                warn!(round = start, "Checkpoint is already at the horizon");
            }
            for _ in 0..to_play {
                orchestrator.tick()?;
            }
            info!(from = start, to = orchestrator.current_round(), "Resumed run");

            if let Some(path) = save_state {
                write_checkpoint(&orchestrator, &path)?;
            }
            print_report(&config, orchestrator.round_rewards(), format)?;
        }
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bandit_simulator_core_rs=info,bandit_sim=info".into());

    // Logs go to stderr so stdout carries only the report
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

const ENV_PREFIX: &str = "BANDIT_SIM";

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("arm_means")
}

impl ConfigOverrides {
    /// Defaults, then the config file, then the environment, then flags
    fn resolve(&self) -> anyhow::Result<SimulationConfig> {
        self.resolve_with(env_source())
    }

    fn resolve_with(&self, env: Environment) -> anyhow::Result<SimulationConfig> {
        let mut builder = Config::builder();
        if let Some(path) = &self.config {
            builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Json));
        }
        let mut config = builder
            .add_source(env)
            .build()
            .and_then(Config::try_deserialize::<SimulationConfig>)
            .with_context(|| match &self.config {
                Some(path) => format!("loading config file {}", path.display()),
                None => "loading config from the environment".to_string(),
            })?;

        if let Some(means) = &self.means {
            config.arm_means = means.clone();
            // Keep the arm count in step with new means unless set explicitly
            config.n_arms = means.len();
        }
        if let Some(arms) = self.arms {
            config.n_arms = arms;
        }
        if let Some(users) = self.users {
            config.n_users = users;
        }
        if let Some(horizon) = self.horizon {
            config.t_horizon = horizon;
        }
        if let Some(seed) = self.seed {
            config.rng_seed = seed;
        }
        if let Some(policy) = self.policy {
            config.policy = policy;
        }

        info!(
            n_users = config.n_users,
            n_arms = config.n_arms,
            t_horizon = config.t_horizon,
            rng_seed = config.rng_seed,
            policy = ?config.policy,
            "Resolved configuration"
        );

        Ok(config)
    }
}

fn write_checkpoint(orchestrator: &Orchestrator, path: &Path) -> anyhow::Result<()> {
    let json = orchestrator.save_state()?;
    fs::write(path, json).with_context(|| format!("writing checkpoint {}", path.display()))?;
    info!(path = %path.display(), round = orchestrator.current_round(), "Saved checkpoint");
    Ok(())
}

fn print_report(
    config: &SimulationConfig,
    round_rewards: &[f64],
    format: OutputFormat,
) -> anyhow::Result<()> {
    let report = RegretReport::new(&config.arm_means, config.n_users, round_rewards);

    match format {
        OutputFormat::Csv => {
            println!("round,reward,cumulative_regret");
            for (round, (reward, regret)) in report
                .round_rewards
                .iter()
                .zip(&report.cumulative_regret)
                .enumerate()
            {
                println!("{},{},{:.6}", round, reward, regret);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    info!(
        total_reward = report.total_reward(),
        final_regret = report.final_regret(),
        "Report written"
    );
    Ok(())
}
