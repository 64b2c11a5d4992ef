//! Six-row status screen model and the presentation seam.
//!
//! The screen is a fixed stack of rows (FortiusANT, USB, calibration,
//! Bluetooth, trainer, shutdown). Phases and the shutdown sequence only edit
//! [`MonitorState`]; drawing happens through a [`DisplaySink`] that receives a
//! full frame per [`RenderRequest`].

use std::fmt;

use crate::error::Result;

pub const ROW_COUNT: usize = 6;

/// 24-bit RGB color used for row text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    pub const GREY: Color = Color::rgb(0x7A, 0x7A, 0x7A);
    pub const AMBER: Color = Color::rgb(0xFC, 0x81, 0x06);
    pub const GREEN: Color = Color::rgb(0x00, 0xEE, 0x00);
    pub const RED: Color = Color::rgb(0xFF, 0x30, 0x30);
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn name(&self) -> &'static str {
        match *self {
            Color::WHITE => "white",
            Color::GREY => "grey",
            Color::AMBER => "amber",
            Color::GREEN => "green",
            Color::RED => "red",
            Color::BLACK => "black",
            _ => "custom",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Screen rows, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Row {
    Controller,
    Usb,
    Calibration,
    Bluetooth,
    Trainer,
    Shutdown,
}

impl Row {
    pub const ALL: [Row; ROW_COUNT] = [
        Row::Controller,
        Row::Usb,
        Row::Calibration,
        Row::Bluetooth,
        Row::Trainer,
        Row::Shutdown,
    ];

    pub fn index(self) -> usize {
        match self {
            Row::Controller => 0,
            Row::Usb => 1,
            Row::Calibration => 2,
            Row::Bluetooth => 3,
            Row::Trainer => 4,
            Row::Shutdown => 5,
        }
    }

    /// Top edge of the row in panel pixels. The calibration row spans two
    /// text lines, hence the wider gap below it.
    pub fn y_offset(self) -> i32 {
        match self {
            Row::Controller => -2,
            Row::Usb => 50,
            Row::Calibration => 75,
            Row::Bluetooth => 125,
            Row::Trainer => 150,
            Row::Shutdown => 175,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLine {
    pub text: String,
    pub color: Color,
}

impl DisplayLine {
    pub fn new(text: impl Into<String>, color: Color) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }
}

/// A change to one row. `None` leaves that attribute untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineEdit {
    pub row: Row,
    pub text: Option<&'static str>,
    pub color: Option<Color>,
}

impl LineEdit {
    pub const fn set(row: Row, text: &'static str, color: Color) -> Self {
        Self {
            row,
            text: Some(text),
            color: Some(color),
        }
    }

    pub const fn text(row: Row, text: &'static str) -> Self {
        Self {
            row,
            text: Some(text),
            color: None,
        }
    }

    pub const fn color(row: Row, color: Color) -> Self {
        Self {
            row,
            text: None,
            color: Some(color),
        }
    }
}

pub mod text {
    pub const CONTROLLER_LABEL: &str = "FortiusANT";
    pub const CONTROLLER_WAITING: &str = "FortiusAnt\n -waiting to start";
    pub const CONTROLLER_STARTED: &str = "FortiusAnt-started";
    pub const USB_LABEL: &str = "USB Connection";
    pub const USB_CONNECTED: &str = "USB connected";
    pub const CALIBRATION_LABEL: &str = "Calibration";
    pub const CALIBRATION_START: &str = "Calibration-start\n >turn pedals";
    pub const CALIBRATING: &str = "Calibrating\n - don't pedal";
    pub const CALIBRATION_DONE: &str = "Calibration\n - completed";
    pub const BLUETOOTH_LABEL: &str = "Bluetooth";
    pub const BLUETOOTH_ON: &str = "Bluetooth On";
    pub const BLUETOOTH_OFF: &str = "Bluetooth Off";
    pub const TRAINER_LABEL: &str = "Trainer";
    pub const TRAINER_RUNNING: &str = "Trainer Running";
    pub const TRAINER_STOPPED: &str = "Trainer stopped";
    pub const SHUTDOWN_LABEL: &str = "Shutdown\n> Press button 23";
    pub const SHUTTING_DOWN: &str = "Shutting down\n please wait";
    pub const SAFE_TO_POWER_OFF: &str = "OK to cut power\nwhen green LED off";
}

/// Everything the screen shows, owned by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorState {
    lines: [DisplayLine; ROW_COUNT],
}

impl MonitorState {
    /// Labels only: controller row white, everything else greyed out.
    pub fn initial() -> Self {
        Self {
            lines: [
                DisplayLine::new(text::CONTROLLER_LABEL, Color::WHITE),
                DisplayLine::new(text::USB_LABEL, Color::GREY),
                DisplayLine::new(text::CALIBRATION_LABEL, Color::GREY),
                DisplayLine::new(text::BLUETOOTH_LABEL, Color::GREY),
                DisplayLine::new(text::TRAINER_LABEL, Color::GREY),
                DisplayLine::new(text::SHUTDOWN_LABEL, Color::GREY),
            ],
        }
    }

    pub fn line(&self, row: Row) -> &DisplayLine {
        &self.lines[row.index()]
    }

    pub fn lines(&self) -> &[DisplayLine; ROW_COUNT] {
        &self.lines
    }

    pub fn apply(&mut self, edit: &LineEdit) {
        let line = &mut self.lines[edit.row.index()];
        if let Some(text) = edit.text {
            line.text = text.to_string();
        }
        if let Some(color) = edit.color {
            line.color = color;
        }
    }

    pub fn apply_all(&mut self, edits: &[LineEdit]) {
        for edit in edits {
            self.apply(edit);
        }
    }

    /// Switches the controller row to "waiting" and greys out the rest.
    pub fn show_waiting(&mut self) {
        self.apply(&LineEdit::set(
            Row::Controller,
            text::CONTROLLER_WAITING,
            Color::AMBER,
        ));
        for row in &Row::ALL[1..] {
            self.apply(&LineEdit::color(*row, Color::GREY));
        }
    }

    pub fn render(&self, reason: RenderReason) -> RenderRequest {
        RenderRequest {
            reason,
            frame: self.lines.clone(),
        }
    }
}

impl Default for MonitorState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Why a frame was produced; carried into logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderReason {
    Startup,
    WaitingForLog,
    Phase(usize),
    ShuttingDown,
    SafeToPowerOff,
}

/// A full-frame replacement of all six rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub reason: RenderReason,
    pub frame: [DisplayLine; ROW_COUNT],
}

impl RenderRequest {
    pub fn line(&self, row: Row) -> &DisplayLine {
        &self.frame[row.index()]
    }
}

/// Draw-and-present sink for the physical panel.
///
/// `present` is synchronous: the frame is on the glass when it returns.
pub trait DisplaySink {
    fn present(&mut self, request: &RenderRequest) -> Result<()>;
}

impl<T: DisplaySink + ?Sized> DisplaySink for Box<T> {
    fn present(&mut self, request: &RenderRequest) -> Result<()> {
        (**self).present(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_highlights_only_controller_row() {
        let state = MonitorState::initial();
        assert_eq!(
            state.line(Row::Controller),
            &DisplayLine::new("FortiusANT", Color::WHITE)
        );
        for row in &Row::ALL[1..] {
            assert_eq!(state.line(*row).color, Color::GREY);
        }
        assert_eq!(state.line(Row::Shutdown).text, "Shutdown\n> Press button 23");
    }

    #[test]
    fn show_waiting_turns_controller_amber() {
        let mut state = MonitorState::initial();
        state.show_waiting();
        assert_eq!(
            state.line(Row::Controller),
            &DisplayLine::new("FortiusAnt\n -waiting to start", Color::AMBER)
        );
        assert_eq!(state.line(Row::Usb).color, Color::GREY);
    }

    #[test]
    fn partial_edits_keep_untouched_attributes() {
        let mut state = MonitorState::initial();
        state.apply(&LineEdit::color(Row::Usb, Color::WHITE));
        assert_eq!(state.line(Row::Usb), &DisplayLine::new("USB Connection", Color::WHITE));

        state.apply(&LineEdit::text(Row::Bluetooth, "Bluetooth On"));
        assert_eq!(state.line(Row::Bluetooth), &DisplayLine::new("Bluetooth On", Color::GREY));
    }

    #[test]
    fn render_snapshots_current_lines() {
        let mut state = MonitorState::initial();
        let before = state.render(RenderReason::Startup);
        state.apply(&LineEdit::set(Row::Trainer, "Trainer Running", Color::GREEN));

        assert_eq!(before.line(Row::Trainer).text, "Trainer");
        assert_eq!(
            state.render(RenderReason::Phase(6)).line(Row::Trainer).color,
            Color::GREEN
        );
    }

    #[test]
    fn color_formats_as_hex() {
        assert_eq!(Color::AMBER.to_string(), "#FC8106");
        assert_eq!(Color::GREY.name(), "grey");
    }
}
