//! Poll loop tying the log, the phase machine, the buttons and the screen
//! together on a single thread.
//!
//! ```text
//! startup screen → waiting screen → wait for log (1 s)
//!   → phase loop (0.5 s, 1.5 s dwell after each render)
//!   → idle loop (2 s)
//! ```
//!
//! The button is sampled at least once per active interval in every stage,
//! including inside the render dwell, so a shutdown request is acted on
//! within one interval wherever the loop happens to be.

use std::thread;
use std::time::Duration;

use crate::artifacts::ArtifactPattern;
use crate::buttons::{ButtonMonitor, ButtonSource};
use crate::config::{MonitorConfig, TimingConfig};
use crate::display::{DisplaySink, MonitorState, RenderReason, RenderRequest};
use crate::error::Result;
use crate::log_tailer::LogTailer;
use crate::phases::PhaseStateMachine;
use crate::power::PowerOff;
use crate::shutdown::{ShutdownCoordinator, ShutdownReport};

/// Timed suspension between polls.
pub trait Pacer {
    fn sleep(&mut self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

pub struct Orchestrator<S: DisplaySink, B: ButtonSource, P: PowerOff, Z: Pacer = ThreadPacer> {
    timing: TimingConfig,
    tailer: LogTailer,
    machine: PhaseStateMachine,
    coordinator: ShutdownCoordinator,
    buttons: ButtonMonitor<B>,
    state: MonitorState,
    sink: S,
    power: P,
    pacer: Z,
}

impl<S: DisplaySink, B: ButtonSource, P: PowerOff, Z: Pacer> Orchestrator<S, B, P, Z> {
    pub fn new(config: &MonitorConfig, sink: S, buttons: B, power: P, pacer: Z) -> Result<Self> {
        config.validate()?;
        let tailer = LogTailer::new(ArtifactPattern::new(
            &config.logs.dir,
            &config.logs.primary_pattern,
        )?);
        let machine = match &config.markers.list {
            Some(markers) => PhaseStateMachine::from_marker_list(markers.clone())?,
            None => PhaseStateMachine::new(),
        };

        Ok(Self {
            timing: config.timing.clone(),
            tailer,
            machine,
            coordinator: ShutdownCoordinator::from_config(config)?,
            buttons: ButtonMonitor::new(buttons, config.buttons.confirm_samples),
            state: MonitorState::initial(),
            sink,
            power,
            pacer,
        })
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    pub fn machine(&self) -> &PhaseStateMachine {
        &self.machine
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn power(&self) -> &P {
        &self.power
    }

    pub fn pacer(&self) -> &Z {
        &self.pacer
    }

    /// Runs until the shutdown gesture, then performs the shutdown sequence.
    ///
    /// Returns the cleanup report once power-off has been issued. Errors are
    /// limited to the first render (display unusable) and a failed power-off.
    pub fn run(&mut self) -> Result<ShutdownReport> {
        let startup = self.state.render(RenderReason::Startup);
        self.sink.present(&startup)?;

        self.state.show_waiting();
        let waiting = self.state.render(RenderReason::WaitingForLog);
        self.present(&waiting);

        if self.wait_for_log() {
            return self.shut_down();
        }

        while !self.machine.is_terminal() {
            if self.buttons.poll() {
                return self.shut_down();
            }

            let snapshot = self.tailer.read();
            let pause = match self.machine.advance(&snapshot.content, &mut self.state) {
                Some(request) => {
                    self.present(&request);
                    self.timing.render_dwell()
                }
                None => self.timing.poll(),
            };

            if self.pause(pause, self.timing.poll()) {
                return self.shut_down();
            }
        }

        tracing::info!("All phases reached; watching for shutdown only");
        loop {
            if self.buttons.poll() {
                return self.shut_down();
            }
            self.pacer.sleep(self.timing.idle_poll());
        }
    }

    /// Blocks until the first primary log exists, sampling the button once
    /// per attempt. Returns true if shutdown was requested while waiting.
    fn wait_for_log(&mut self) -> bool {
        let mut announced = false;
        loop {
            if let Some(path) = self.tailer.latest_log() {
                tracing::info!(path = %path.display(), "Log file found");
                return false;
            }
            if self.buttons.poll() {
                return true;
            }
            if !announced {
                tracing::info!(
                    dir = %self.tailer.pattern().dir().display(),
                    pattern = self.tailer.pattern().pattern(),
                    "Waiting for log file"
                );
                announced = true;
            }
            self.pacer.sleep(self.timing.log_wait());
        }
    }

    /// Sleeps for `total` in slices of at most `slice`, sampling the button
    /// between slices. The sample after the final slice is left to the
    /// caller's next cycle. Returns true if shutdown was requested.
    fn pause(&mut self, total: Duration, slice: Duration) -> bool {
        let mut remaining = total;
        while !remaining.is_zero() {
            let step = remaining.min(slice);
            self.pacer.sleep(step);
            remaining -= step;
            if !remaining.is_zero() && self.buttons.poll() {
                return true;
            }
        }
        false
    }

    fn present(&mut self, request: &RenderRequest) {
        if let Err(err) = self.sink.present(request) {
            tracing::error!(error = %err, reason = ?request.reason, "Failed to update display");
        }
    }

    fn shut_down(&mut self) -> Result<ShutdownReport> {
        tracing::info!(
            phase = self.machine.active_index(),
            "Stopping phase tracking for shutdown"
        );
        self.coordinator
            .on_shutdown_requested(&mut self.state, &mut self.sink, &mut self.power)
    }
}
