//! # monitor-core
//!
//! Phase tracking and shutdown sequencing for a FortiusANT trainer host with a
//! 240x240 status panel and two buttons.
//!
//! ## Design Principles
//!
//! - **Synchronous**: one thread, timed polls, no async runtime.
//! - **Hardware at the edges**: the panel, the buttons, power-off and sleeping
//!   are traits ([`DisplaySink`], [`ButtonSource`], [`PowerOff`], [`Pacer`]);
//!   the binary supplies real implementations, tests supply fakes.
//! - **Graceful degradation**: a missing or unreadable log reads as empty, a
//!   file that vanishes during cleanup counts as removed.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use monitor_core::{load_config, CommandPowerOff, Orchestrator, ThreadPacer};
//!
//! let config = load_config(None)?;
//! let power = CommandPowerOff::new(config.power.command.clone());
//! let mut monitor = Orchestrator::new(&config, panel, buttons, power, ThreadPacer)?;
//! let report = monitor.run()?;
//! ```

pub mod artifacts;
pub mod buttons;
pub mod config;
pub mod display;
pub mod error;
pub mod log_tailer;
pub mod orchestrator;
pub mod phases;
pub mod power;
pub mod shutdown;

pub use artifacts::{ArtifactPattern, CleanupOutcome};
pub use buttons::{ButtonLevels, ButtonMonitor, ButtonSource};
pub use config::{default_config_path, load_config, MonitorConfig};
pub use display::{Color, DisplayLine, DisplaySink, MonitorState, RenderReason, RenderRequest, Row};
pub use error::{MonitorError, Result};
pub use log_tailer::{LogSnapshot, LogTailer};
pub use orchestrator::{Orchestrator, Pacer, ThreadPacer};
pub use phases::{Phase, PhaseStateMachine, PHASES, PHASE_COUNT};
pub use power::{CommandPowerOff, NoopPowerOff, PowerOff};
pub use shutdown::{ShutdownCoordinator, ShutdownReport};
