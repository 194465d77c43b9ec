use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};

use memtrail::config::{self, Config, ConfigScope, load_config, load_config_from_path};
use memtrail::sampler::{Sampler, start_session};
use memtrail::sampler::governor::RateGovernor;
use memtrail::system::probe::SysinfoProbe;
use memtrail::{logging, viewer};

#[derive(Parser)]
#[command(
    name = "memtrail",
    version,
    about = "Trace memory and CPU usage of a command and all of its children",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Path to config file (skips the global/local lookup)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Sampling period in seconds
    #[arg(long)]
    rate: Option<f64>,

    /// Do not open the viewer after the command exits
    #[arg(long, default_value_t = false)]
    no_gui: bool,

    /// Directory the session folder is created in
    #[arg(long)]
    output_root: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    /// Write JSON log lines (with cycle span timings) to this file
    #[arg(long, global = true)]
    log_json: Option<PathBuf>,

    #[command(subcommand)]
    action: Option<Action>,

    /// Command to trace, with its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[derive(Subcommand)]
enum Action {
    /// Show a recorded session
    Plot {
        /// Session directory
        dir: PathBuf,

        /// Re-read the session periodically while it is still being written
        #[arg(long, default_value_t = false)]
        follow: bool,
    },
    /// Show or edit the configuration files
    Config {
        /// Edit ./memtrail.toml instead of the global file
        #[arg(long, default_value_t = false)]
        local: bool,

        /// Print the effective configuration
        #[arg(long, default_value_t = false)]
        list: bool,

        /// Store a sampling period in seconds
        #[arg(long)]
        rate: Option<f64>,

        /// Open the viewer after tracing
        #[arg(long, conflicts_with = "no_show_gui")]
        show_gui: bool,

        /// Do not open the viewer after tracing
        #[arg(long)]
        no_show_gui: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    match &cli.log_json {
        Some(path) => logging::init_json(path, cli.verbose)?,
        None => logging::init_stderr(cli.verbose)?,
    }

    match &cli.action {
        Some(Action::Plot { dir, follow }) => {
            let config = load_config_for_cli(&cli);
            viewer::render(dir, &config.viewer, *follow)
                .await
                .wrap_err_with(|| format!("cannot show session {}", dir.display()))?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Action::Config {
            local,
            list,
            rate,
            show_gui,
            no_show_gui,
        }) => {
            let scope = if *local {
                ConfigScope::Local
            } else {
                ConfigScope::Global
            };
            edit_config(&cli, scope, *list, *rate, *show_gui, *no_show_gui)?;
            Ok(ExitCode::SUCCESS)
        }
        None if cli.command.is_empty() => {
            Cli::command().print_help()?;
            Ok(ExitCode::FAILURE)
        }
        None => trace(&cli).await,
    }
}

async fn trace(cli: &Cli) -> Result<ExitCode> {
    let config = load_config_for_cli(cli);
    let (store, mut launched) = start_session(&config.sampling.output_root, &cli.command)?;
    let session_dir = store.dir().to_path_buf();
    tracing::info!(dir = %session_dir.display(), "session directory created");

    let governor = RateGovernor::from_rate_secs(config.sampling.rate);

    let (summary, mut launched) = tokio::task::spawn_blocking(move || {
        let mut sampler = Sampler::new(SysinfoProbe::new(), store, governor);
        let summary = sampler.run(&mut launched);
        (summary, launched)
    })
    .await
    .map_err(|e| eyre!("sampling task failed: {e}"))?;

    let status = launched.wait()?;
    let summary = summary?;
    println!(
        "memtrail: {} cycles, {} child processes, session in {}",
        summary.cycles,
        summary.tracked_children,
        session_dir.display()
    );
    if !status.success() {
        tracing::warn!(%status, "traced command exited unsuccessfully");
    }

    if config.viewer.show_gui && std::io::stdout().is_terminal() {
        viewer::render(&session_dir, &config.viewer, false).await?;
    }

    Ok(ExitCode::SUCCESS)
}

fn load_config_for_cli(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(rate) = cli.rate {
        config.sampling.rate = rate;
    }
    if cli.no_gui {
        config.viewer.show_gui = false;
    }
    if let Some(ref root) = cli.output_root {
        config.sampling.output_root = root.clone();
    }

    config
}

fn edit_config(
    cli: &Cli,
    scope: ConfigScope,
    list: bool,
    rate: Option<f64>,
    show_gui: bool,
    no_show_gui: bool,
) -> Result<()> {
    let mut updates: Vec<(&str, &str, toml::Value)> = Vec::new();
    if let Some(rate) = rate {
        updates.push(("sampling", "rate", toml::Value::Float(rate)));
    }
    if show_gui || no_show_gui {
        updates.push(("viewer", "show_gui", toml::Value::Boolean(show_gui)));
    }

    for (section, key, value) in updates.iter().cloned() {
        let path = config::set_value(scope, section, key, value)?;
        println!("{section}.{key} written to {}", path.display());
    }

    if list || updates.is_empty() {
        print!("{}", config::render_config(&load_config_for_cli(cli)));
    }
    Ok(())
}
