//! Stand-ins for the panel and buttons on machines without them.
//!
//! Frames go to the log; the shutdown gesture is simulated by creating a
//! trigger file (`touch /tmp/trainer-monitor.shutdown`).

use std::path::PathBuf;

use monitor_core::{ButtonLevels, ButtonSource, DisplaySink, RenderRequest, Result, Row};

/// Logs every frame, one event per row.
#[derive(Debug, Default)]
pub struct TracingPanel {
    frames: usize,
}

impl DisplaySink for TracingPanel {
    fn present(&mut self, request: &RenderRequest) -> Result<()> {
        self.frames += 1;
        tracing::info!(frame = self.frames, reason = ?request.reason, "Panel frame");
        for row in Row::ALL {
            let line = request.line(row);
            tracing::info!(
                row = ?row,
                color = line.color.name(),
                text = %line.text.replace('\n', " / "),
                "  row"
            );
        }
        Ok(())
    }
}

/// Lower button reads as held while the trigger file exists.
#[derive(Debug, Clone)]
pub struct TriggerFileButtons {
    path: PathBuf,
}

impl TriggerFileButtons {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ButtonSource for TriggerFileButtons {
    fn read(&mut self) -> Result<ButtonLevels> {
        Ok(ButtonLevels {
            lower_pressed: self.path.exists(),
            upper_pressed: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_core::{MonitorState, RenderReason};
    use tempfile::TempDir;

    #[test]
    fn trigger_file_presence_is_the_shutdown_gesture() {
        let temp = TempDir::new().expect("temp dir");
        let trigger = temp.path().join("shutdown");
        let mut buttons = TriggerFileButtons::new(trigger.clone());

        assert!(!buttons.read().expect("read").is_shutdown_gesture());
        fs_err::write(&trigger, "").expect("touch trigger");
        assert!(buttons.read().expect("read").is_shutdown_gesture());
    }

    #[test]
    fn tracing_panel_accepts_frames() {
        let mut panel = TracingPanel::default();
        let frame = MonitorState::initial().render(RenderReason::Startup);
        panel.present(&frame).expect("present");
        panel.present(&frame).expect("present");
        assert_eq!(panel.frames, 2);
    }
}
