//! Ordered lifecycle phases inferred from the FortiusANT log.
//!
//! Each phase is unlocked by a literal marker appearing anywhere in the log
//! snapshot, but only the *current* phase's marker is ever consulted, so a
//! later marker never lets the machine skip ahead.
//!
//! ```text
//! started → trainer-connected → calibration-start → calibrating
//!   → calibration-done → bluetooth-on → running → bluetooth-off → stopped
//! ```
//!
//! At most one phase is applied per [`PhaseStateMachine::advance`] call. A
//! snapshot that satisfies several markers at once unlocks them on
//! consecutive poll cycles.

use crate::display::{text, Color, LineEdit, MonitorState, RenderReason, RenderRequest, Row};
use crate::error::{MonitorError, Result};

pub const PHASE_COUNT: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phase {
    pub name: &'static str,
    pub marker: &'static str,
    pub edits: &'static [LineEdit],
}

pub static PHASES: [Phase; PHASE_COUNT] = [
    Phase {
        name: "started",
        marker: "FortiusANT started",
        edits: &[
            LineEdit::set(Row::Controller, text::CONTROLLER_STARTED, Color::GREEN),
            LineEdit::color(Row::Usb, Color::WHITE),
        ],
    },
    Phase {
        name: "trainer-connected",
        marker: "Connected to Tacx Trainer T1932",
        edits: &[
            LineEdit::set(Row::Usb, text::USB_CONNECTED, Color::GREEN),
            LineEdit::color(Row::Calibration, Color::WHITE),
        ],
    },
    Phase {
        name: "calibration-start",
        marker: "G I V E   A   P E D A L   K I C K",
        edits: &[
            LineEdit::set(Row::Calibration, text::CALIBRATION_START, Color::AMBER),
            LineEdit::text(Row::Bluetooth, text::BLUETOOTH_LABEL),
        ],
    },
    Phase {
        name: "calibrating",
        marker: "C A L I B R A T I N G",
        edits: &[LineEdit::set(
            Row::Calibration,
            text::CALIBRATING,
            Color::AMBER,
        )],
    },
    Phase {
        name: "calibration-done",
        marker: "FortiusANT exchanges data with a bluetooth",
        edits: &[
            LineEdit::set(Row::Calibration, text::CALIBRATION_DONE, Color::GREEN),
            LineEdit::color(Row::Bluetooth, Color::WHITE),
        ],
    },
    Phase {
        name: "bluetooth-on",
        marker: "BLE-devices are activated",
        edits: &[LineEdit::set(Row::Bluetooth, text::BLUETOOTH_ON, Color::GREEN)],
    },
    Phase {
        name: "running",
        marker: "Target=100W",
        edits: &[LineEdit::set(Row::Trainer, text::TRAINER_RUNNING, Color::GREEN)],
    },
    Phase {
        name: "bluetooth-off",
        marker: "Stopped",
        edits: &[LineEdit::set(Row::Bluetooth, text::BLUETOOTH_OFF, Color::RED)],
    },
    Phase {
        name: "stopped",
        marker: "BLE-devices are deactivated",
        edits: &[LineEdit::set(Row::Trainer, text::TRAINER_STOPPED, Color::RED)],
    },
];

#[derive(Debug, Clone)]
pub struct PhaseStateMachine {
    markers: [String; PHASE_COUNT],
    applied: usize,
}

impl PhaseStateMachine {
    pub fn new() -> Self {
        Self::with_markers(PHASES.map(|phase| phase.marker.to_string()))
    }

    /// Uses caller-supplied markers, one per phase in phase order.
    pub fn with_markers(markers: [String; PHASE_COUNT]) -> Self {
        Self {
            markers,
            applied: 0,
        }
    }

    /// [`with_markers`](Self::with_markers) for a list read from config;
    /// anything other than exactly one marker per phase is rejected.
    pub fn from_marker_list(markers: Vec<String>) -> Result<Self> {
        let markers: [String; PHASE_COUNT] = markers.try_into().map_err(|list: Vec<String>| {
            MonitorError::ConfigInvalid(format!(
                "markers.list must contain {} entries, found {}",
                PHASE_COUNT,
                list.len()
            ))
        })?;
        Ok(Self::with_markers(markers))
    }

    /// Number of phases applied so far; also the index of the phase whose
    /// marker is being looked for.
    pub fn active_index(&self) -> usize {
        self.applied
    }

    pub fn current_phase(&self) -> Option<&'static Phase> {
        PHASES.get(self.applied)
    }

    pub fn last_applied(&self) -> Option<&'static Phase> {
        self.applied.checked_sub(1).and_then(|index| PHASES.get(index))
    }

    pub fn is_terminal(&self) -> bool {
        self.applied >= PHASE_COUNT
    }

    pub fn marker(&self, index: usize) -> Option<&str> {
        self.markers.get(index).map(String::as_str)
    }

    /// Applies the current phase if its marker occurs in `log_content`.
    pub fn advance(&mut self, log_content: &str, state: &mut MonitorState) -> Option<RenderRequest> {
        let index = self.applied;
        let phase = PHASES.get(index)?;
        let marker = self.markers.get(index)?;
        if !log_content.contains(marker.as_str()) {
            return None;
        }

        state.apply_all(phase.edits);
        self.applied += 1;
        tracing::info!(phase = index, name = phase.name, "Phase reached");
        Some(state.render(RenderReason::Phase(index)))
    }
}

impl Default for PhaseStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DisplayLine;

    fn machine_at(index: usize, state: &mut MonitorState) -> PhaseStateMachine {
        let mut machine = PhaseStateMachine::new();
        let all_markers = PHASES
            .iter()
            .map(|phase| phase.marker)
            .collect::<Vec<_>>()
            .join("\n");
        for _ in 0..index {
            machine.advance(&all_markers, state).expect("advance");
        }
        machine
    }

    #[test]
    fn test_each_phase_advances_on_its_own_marker() {
        for index in 0..PHASE_COUNT {
            let mut state = MonitorState::initial();
            let mut machine = machine_at(index, &mut state);
            let mut expected = state.clone();
            expected.apply_all(PHASES[index].edits);

            let log = format!("noise before\n{}\nnoise after", PHASES[index].marker);
            let request = machine.advance(&log, &mut state).expect("render request");

            assert_eq!(machine.active_index(), index + 1);
            assert_eq!(request.reason, RenderReason::Phase(index));
            assert_eq!(&request.frame, expected.lines());
            assert_eq!(state, expected);
        }
    }

    #[test]
    fn test_missing_marker_changes_nothing() {
        for index in 0..PHASE_COUNT {
            let mut state = MonitorState::initial();
            let mut machine = machine_at(index, &mut state);
            let before = state.clone();

            assert!(machine.advance("unrelated output", &mut state).is_none());
            assert_eq!(machine.active_index(), index);
            assert_eq!(state, before);
        }
    }

    #[test]
    fn test_repeated_snapshot_is_idempotent_after_advancing() {
        let mut state = MonitorState::initial();
        let mut machine = PhaseStateMachine::new();
        let log = "FortiusANT started";

        assert!(machine.advance(log, &mut state).is_some());
        let after_first = state.clone();

        assert!(machine.advance(log, &mut state).is_none());
        assert!(machine.advance(log, &mut state).is_none());
        assert_eq!(machine.active_index(), 1);
        assert_eq!(state, after_first);
    }

    #[test]
    fn test_later_marker_does_not_skip_ahead() {
        let mut state = MonitorState::initial();
        let mut machine = machine_at(1, &mut state);

        // Phase 3 marker present, phase 1 marker absent.
        assert!(machine.advance("C A L I B R A T I N G", &mut state).is_none());
        assert_eq!(machine.active_index(), 1);

        let log = "C A L I B R A T I N G\nConnected to Tacx Trainer T1932";
        let request = machine.advance(log, &mut state).expect("phase 1");
        assert_eq!(request.reason, RenderReason::Phase(1));
        assert_eq!(machine.active_index(), 2);
    }

    #[test]
    fn test_single_step_per_poll_when_many_markers_present() {
        let mut state = MonitorState::initial();
        let mut machine = PhaseStateMachine::new();
        let log = "FortiusANT started\nConnected to Tacx Trainer T1932\nG I V E   A   P E D A L   K I C K";

        assert_eq!(
            machine.advance(log, &mut state).map(|r| r.reason),
            Some(RenderReason::Phase(0))
        );
        assert_eq!(machine.active_index(), 1);
        assert_eq!(
            machine.advance(log, &mut state).map(|r| r.reason),
            Some(RenderReason::Phase(1))
        );
        assert_eq!(
            machine.advance(log, &mut state).map(|r| r.reason),
            Some(RenderReason::Phase(2))
        );
        assert!(machine.advance(log, &mut state).is_none());
        assert_eq!(machine.active_index(), 3);
    }

    #[test]
    fn test_terminal_after_last_phase() {
        let mut state = MonitorState::initial();
        let mut machine = machine_at(PHASE_COUNT, &mut state);
        assert!(machine.is_terminal());
        assert!(machine.current_phase().is_none());
        assert_eq!(machine.last_applied().map(|p| p.name), Some("stopped"));

        let before = state.clone();
        assert!(machine.advance("BLE-devices are deactivated", &mut state).is_none());
        assert_eq!(state, before);
        assert_eq!(
            state.line(Row::Trainer),
            &DisplayLine::new("Trainer stopped", Color::RED)
        );
    }

    #[test]
    fn test_marker_override_replaces_connect_marker() {
        let mut markers = PHASES.map(|p| p.marker.to_string());
        markers[1] = "Connected to Tacx Trainer T1942".to_string();
        let mut machine = PhaseStateMachine::with_markers(markers);
        let mut state = MonitorState::initial();

        machine.advance("FortiusANT started", &mut state).expect("phase 0");
        assert!(machine
            .advance("Connected to Tacx Trainer T1932", &mut state)
            .is_none());
        assert!(machine
            .advance("Connected to Tacx Trainer T1942", &mut state)
            .is_some());
    }

    #[test]
    fn test_marker_list_of_wrong_length_is_rejected() {
        let short = PhaseStateMachine::from_marker_list(vec!["custom start".to_string()]);
        assert!(matches!(short, Err(MonitorError::ConfigInvalid(_))));

        let long = PHASES
            .iter()
            .map(|p| p.marker.to_string())
            .chain(std::iter::once("extra".to_string()))
            .collect::<Vec<_>>();
        assert!(PhaseStateMachine::from_marker_list(long).is_err());
    }

    #[test]
    fn test_full_marker_list_is_used_in_order() {
        let markers = (0..PHASE_COUNT).map(|i| format!("step {}", i)).collect();
        let machine = PhaseStateMachine::from_marker_list(markers).expect("nine markers");
        assert_eq!(machine.marker(0), Some("step 0"));
        assert_eq!(machine.marker(8), Some("step 8"));
        assert_eq!(machine.marker(9), None);
    }
}
