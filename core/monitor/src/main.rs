//! trainer-monitor: status panel and shutdown button for a FortiusANT host.
//!
//! Follows the FortiusANT log on a 240x240 panel, and on the shutdown
//! gesture (lower button held) clears out logs and trash before powering
//! the host off.
//!
//! ## Subcommands
//!
//! - (none): run the monitor
//! - `check-config`: print the resolved configuration and exit

mod headless;
mod logging;

#[cfg(feature = "hardware")]
mod gpio;
#[cfg(feature = "hardware")]
mod panel;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn};

use monitor_core::{
    load_config, ButtonSource, CommandPowerOff, DisplaySink, MonitorConfig, MonitorError,
    NoopPowerOff, Orchestrator, PowerOff, ThreadPacer,
};

const DEFAULT_TRIGGER_PATH: &str = "/tmp/trainer-monitor.shutdown";

#[derive(Parser)]
#[command(name = "trainer-monitor")]
#[command(about = "FortiusANT status panel and shutdown controller")]
#[command(version)]
struct Cli {
    /// Configuration file (default: ~/.config/trainer-monitor/monitor.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Also write logs to a daily file in this directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Log frames instead of drawing them and read the shutdown gesture
    /// from a trigger file
    #[arg(long)]
    headless: bool,

    /// Trigger file used in headless mode
    #[arg(long, value_name = "PATH", default_value = DEFAULT_TRIGGER_PATH)]
    shutdown_trigger: PathBuf,

    /// Log the power-off instead of running the power command
    #[arg(long)]
    no_power_off: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, validate and print the resolved configuration
    CheckConfig,
}

fn main() {
    let cli = Cli::parse();
    let _logging_guard = logging::init(cli.log_dir.as_deref());

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    if let Some(Commands::CheckConfig) = cli.command {
        if let Err(err) = print_config(&config) {
            error!(error = %err, "Invalid configuration");
            std::process::exit(1);
        }
        return;
    }

    if let Err(err) = run(&cli, &config) {
        error!(error = %err, "trainer-monitor failed");
        std::process::exit(1);
    }
}

fn print_config(config: &MonitorConfig) -> Result<(), MonitorError> {
    config.validate()?;
    let rendered = toml::to_string_pretty(config)
        .map_err(|err| MonitorError::ConfigInvalid(err.to_string()))?;
    println!("{}", rendered);
    Ok(())
}

fn run(cli: &Cli, config: &MonitorConfig) -> Result<(), MonitorError> {
    let power: Box<dyn PowerOff> = if cli.no_power_off {
        warn!("Power-off disabled; the host will stay up after cleanup");
        Box::new(NoopPowerOff)
    } else {
        let command = CommandPowerOff::new(config.power.command.clone());
        command.check_privilege()?;
        Box::new(command)
    };

    let (sink, buttons) = open_devices(cli, config)?;

    info!(
        logs = %config.logs.dir.display(),
        trash = %config.trash.dir.display(),
        headless = cli.headless,
        "trainer-monitor started"
    );

    let mut monitor = Orchestrator::new(config, sink, buttons, power, ThreadPacer)?;
    let report = monitor.run()?;
    info!(
        removed = report.removed(),
        failed = report.failed(),
        elapsed_ms = (report.cleaned_at - report.requested_at).num_milliseconds(),
        "Shutdown complete"
    );
    Ok(())
}

type Devices = (Box<dyn DisplaySink>, Box<dyn ButtonSource>);

fn open_devices(cli: &Cli, config: &MonitorConfig) -> Result<Devices, MonitorError> {
    if cli.headless {
        info!(trigger = %cli.shutdown_trigger.display(), "Headless mode");
        return Ok((
            Box::new(headless::TracingPanel::default()),
            Box::new(headless::TriggerFileButtons::new(cli.shutdown_trigger.clone())),
        ));
    }
    open_hardware(config)
}

#[cfg(feature = "hardware")]
fn open_hardware(config: &MonitorConfig) -> Result<Devices, MonitorError> {
    let panel = panel::St7789Panel::open(&config.display, &config.buttons.chip)?;
    let buttons = gpio::GpioButtons::open(&config.buttons)?;
    Ok((Box::new(panel), Box::new(buttons)))
}

#[cfg(not(feature = "hardware"))]
fn open_hardware(_config: &MonitorConfig) -> Result<Devices, MonitorError> {
    Err(MonitorError::Display(
        "built without the `hardware` feature; rebuild with it or pass --headless".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_parses_development_flags() {
        let cli = Cli::parse_from([
            "trainer-monitor",
            "--headless",
            "--no-power-off",
            "--shutdown-trigger",
            "/tmp/stop",
        ]);
        assert!(cli.headless);
        assert!(cli.no_power_off);
        assert_eq!(cli.shutdown_trigger, PathBuf::from("/tmp/stop"));
        assert!(cli.command.is_none());
    }

    #[test]
    fn cli_parses_check_config_subcommand() {
        let cli = Cli::parse_from(["trainer-monitor", "check-config", "--config", "/etc/m.toml"]);
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/m.toml")));
    }

    #[test]
    fn default_config_renders_as_toml() {
        let rendered = toml::to_string_pretty(&MonitorConfig::default()).expect("render");
        assert!(rendered.contains("primary_pattern = \"FortiusAnt.*.log\""));
        assert!(rendered.contains("[timing]"));
    }
}
