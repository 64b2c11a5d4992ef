//! Shutdown sequence triggered by the button gesture.
//!
//! Runs exactly once, in a fixed order:
//!
//! 1. grey out the status rows, show "Shutting down" and render
//! 2. drain the FortiusANT logs
//! 3. drain the FortiusANT GUI logs (usually none)
//! 4. trim trash `files/` and then trash `info/` to the retention count
//! 5. show "OK to cut power" and render
//! 6. power off
//!
//! Cleanup is best effort. Nothing in steps 1-5 can stop the sequence from
//! reaching step 6.

use chrono::{DateTime, Utc};

use crate::artifacts::{ArtifactPattern, CleanupOutcome};
use crate::config::MonitorConfig;
use crate::display::{
    text, Color, DisplaySink, LineEdit, MonitorState, RenderReason, RenderRequest, Row,
};
use crate::error::Result;
use crate::power::PowerOff;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    pub requested_at: DateTime<Utc>,
    pub cleaned_at: DateTime<Utc>,
    pub primary_logs: CleanupOutcome,
    pub secondary_logs: CleanupOutcome,
    pub trash_files: CleanupOutcome,
    pub trash_info: CleanupOutcome,
}

impl ShutdownReport {
    pub fn removed(&self) -> usize {
        self.outcomes().iter().map(|o| o.removed).sum()
    }

    pub fn failed(&self) -> usize {
        self.outcomes().iter().map(|o| o.failed).sum()
    }

    fn outcomes(&self) -> [&CleanupOutcome; 4] {
        [
            &self.primary_logs,
            &self.secondary_logs,
            &self.trash_files,
            &self.trash_info,
        ]
    }
}

#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    primary_logs: ArtifactPattern,
    secondary_logs: ArtifactPattern,
    trash_files: ArtifactPattern,
    trash_info: ArtifactPattern,
    retain: usize,
}

impl ShutdownCoordinator {
    pub fn new(
        primary_logs: ArtifactPattern,
        secondary_logs: ArtifactPattern,
        trash_files: ArtifactPattern,
        trash_info: ArtifactPattern,
        retain: usize,
    ) -> Self {
        Self {
            primary_logs,
            secondary_logs,
            trash_files,
            trash_info,
            retain,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Result<Self> {
        Ok(Self::new(
            ArtifactPattern::new(&config.logs.dir, &config.logs.primary_pattern)?,
            ArtifactPattern::new(&config.logs.dir, &config.logs.secondary_pattern)?,
            ArtifactPattern::new(config.trash.files_dir(), &config.trash.pattern)?,
            ArtifactPattern::new(config.trash.info_dir(), &config.trash.pattern)?,
            config.trash.retain,
        ))
    }

    /// Runs the whole sequence. Only a failed power-off is reported as an
    /// error; on success the host is going down.
    pub fn on_shutdown_requested(
        &self,
        state: &mut MonitorState,
        sink: &mut dyn DisplaySink,
        power: &mut dyn PowerOff,
    ) -> Result<ShutdownReport> {
        let requested_at = Utc::now();
        tracing::info!("Shutdown requested");

        present(sink, &show_shutting_down(state));

        let report = self.clean_up(requested_at);
        tracing::info!(
            removed = report.removed(),
            failed = report.failed(),
            primary_logs = report.primary_logs.removed,
            secondary_logs = report.secondary_logs.removed,
            trash_files = report.trash_files.removed,
            trash_info = report.trash_info.removed,
            "Cleanup finished"
        );

        present(sink, &show_safe_to_power_off(state));

        power.power_off()?;
        Ok(report)
    }

    /// Steps 2-4: log drain and trash trim.
    pub fn clean_up(&self, requested_at: DateTime<Utc>) -> ShutdownReport {
        let primary_logs = self.primary_logs.drain();
        let secondary_logs = if self.secondary_logs.is_empty() {
            tracing::debug!(pattern = self.secondary_logs.pattern(), "No GUI logs to remove");
            CleanupOutcome::default()
        } else {
            self.secondary_logs.drain()
        };
        let trash_files = self.trash_files.trim_to(self.retain);
        let trash_info = self.trash_info.trim_to(self.retain);

        ShutdownReport {
            requested_at,
            cleaned_at: Utc::now(),
            primary_logs,
            secondary_logs,
            trash_files,
            trash_info,
        }
    }
}

fn show_shutting_down(state: &mut MonitorState) -> RenderRequest {
    for row in &Row::ALL[..Row::ALL.len() - 1] {
        state.apply(&LineEdit::color(*row, Color::GREY));
    }
    state.apply(&LineEdit::set(Row::Shutdown, text::SHUTTING_DOWN, Color::AMBER));
    state.render(RenderReason::ShuttingDown)
}

fn show_safe_to_power_off(state: &mut MonitorState) -> RenderRequest {
    state.apply(&LineEdit::set(
        Row::Shutdown,
        text::SAFE_TO_POWER_OFF,
        Color::GREEN,
    ));
    state.render(RenderReason::SafeToPowerOff)
}

fn present(sink: &mut dyn DisplaySink, request: &RenderRequest) {
    if let Err(err) = sink.present(request) {
        tracing::error!(error = %err, reason = ?request.reason, "Failed to update display");
    }
}
