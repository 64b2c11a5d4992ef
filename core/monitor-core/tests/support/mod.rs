//! Fakes for the hardware seams, driven by a shared virtual clock.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use monitor_core::{
    ButtonLevels, ButtonSource, DisplaySink, MonitorConfig, MonitorError, Pacer, PowerOff,
    RenderReason, RenderRequest, Result,
};

#[derive(Debug, Clone, Default)]
pub struct Clock(Rc<Cell<Duration>>);

impl Clock {
    pub fn now(&self) -> Duration {
        self.0.get()
    }

    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by);
    }
}

/// Pacer that advances the virtual clock and runs a hook after each sleep.
pub struct VirtualPacer {
    clock: Clock,
    pub sleeps: Vec<Duration>,
    max_sleeps: usize,
    on_sleep: Box<dyn FnMut(Duration)>,
}

impl VirtualPacer {
    pub fn new(clock: Clock) -> Self {
        Self::with_hook(clock, |_| {})
    }

    pub fn with_hook(clock: Clock, on_sleep: impl FnMut(Duration) + 'static) -> Self {
        Self {
            clock,
            sleeps: Vec::new(),
            max_sleeps: 1_000,
            on_sleep: Box::new(on_sleep),
        }
    }
}

impl Pacer for VirtualPacer {
    fn sleep(&mut self, duration: Duration) {
        assert!(
            self.sleeps.len() < self.max_sleeps,
            "poll loop never reached shutdown"
        );
        self.clock.advance(duration);
        self.sleeps.push(duration);
        (self.on_sleep)(self.clock.now());
    }
}

/// Buttons that show the shutdown gesture from `press_at` onward.
pub struct ClockButtons {
    clock: Clock,
    press_at: Rc<Cell<Option<Duration>>>,
    pub reads: Rc<RefCell<Vec<Duration>>>,
}

impl ClockButtons {
    pub fn new(clock: Clock, press_at: Rc<Cell<Option<Duration>>>) -> Self {
        Self {
            clock,
            press_at,
            reads: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl ButtonSource for ClockButtons {
    fn read(&mut self) -> Result<ButtonLevels> {
        let now = self.clock.now();
        self.reads.borrow_mut().push(now);
        let pressed = self.press_at.get().map(|at| now >= at).unwrap_or(false);
        Ok(ButtonLevels {
            lower_pressed: pressed,
            upper_pressed: false,
        })
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub frames: Vec<RenderRequest>,
    pub fail: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            frames: Vec::new(),
            fail: true,
        }
    }

    pub fn reasons(&self) -> Vec<RenderReason> {
        self.frames.iter().map(|frame| frame.reason).collect()
    }

    pub fn frame(&self, reason: RenderReason) -> &RenderRequest {
        self.frames
            .iter()
            .find(|frame| frame.reason == reason)
            .unwrap_or_else(|| panic!("no frame for {:?}", reason))
    }
}

impl DisplaySink for RecordingSink {
    fn present(&mut self, request: &RenderRequest) -> Result<()> {
        self.frames.push(request.clone());
        if self.fail {
            return Err(MonitorError::Display("panel disconnected".to_string()));
        }
        Ok(())
    }
}

pub struct RecordingPower {
    clock: Clock,
    pub calls: Vec<Duration>,
    fail: bool,
}

impl RecordingPower {
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            calls: Vec::new(),
            fail: false,
        }
    }

    pub fn failing(clock: Clock) -> Self {
        Self {
            clock,
            calls: Vec::new(),
            fail: true,
        }
    }
}

impl PowerOff for RecordingPower {
    fn power_off(&mut self) -> Result<()> {
        self.calls.push(self.clock.now());
        if self.fail {
            return Err(MonitorError::PowerOff {
                command: "shutdown -h now".to_string(),
                details: "exited with exit status: 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Config rooted in a temp dir: `<root>/logs` and `<root>/Trash`.
pub fn config_in(root: &Path) -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.logs.dir = root.join("logs");
    config.trash.dir = root.join("Trash");
    config
}

pub fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}
