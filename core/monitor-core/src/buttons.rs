//! Shutdown gesture detection over two push buttons.
//!
//! The gesture is level-triggered: lower button held, upper button released,
//! seen on `confirm_samples` consecutive polls. Once seen it is latched for
//! the rest of the process lifetime.

use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonLevels {
    pub lower_pressed: bool,
    pub upper_pressed: bool,
}

impl ButtonLevels {
    /// Converts raw line levels. With `active_low` a pressed button reads 0.
    pub fn from_raw(lower_level: bool, upper_level: bool, active_low: bool) -> Self {
        Self {
            lower_pressed: lower_level != active_low,
            upper_pressed: upper_level != active_low,
        }
    }

    pub fn is_shutdown_gesture(&self) -> bool {
        self.lower_pressed && !self.upper_pressed
    }
}

/// Boolean-level source for the two buttons.
pub trait ButtonSource {
    fn read(&mut self) -> Result<ButtonLevels>;
}

impl<T: ButtonSource + ?Sized> ButtonSource for Box<T> {
    fn read(&mut self) -> Result<ButtonLevels> {
        (**self).read()
    }
}

#[derive(Debug)]
pub struct ButtonMonitor<S: ButtonSource> {
    source: S,
    confirm_samples: u32,
    streak: u32,
    latched: bool,
    read_failing: bool,
}

impl<S: ButtonSource> ButtonMonitor<S> {
    pub fn new(source: S, confirm_samples: u32) -> Self {
        Self {
            source,
            confirm_samples: confirm_samples.max(1),
            streak: 0,
            latched: false,
            read_failing: false,
        }
    }

    /// Takes one sample and reports whether shutdown has been requested.
    /// A failed read counts as "no gesture" for this sample.
    pub fn poll(&mut self) -> bool {
        if self.latched {
            return true;
        }

        let levels = match self.source.read() {
            Ok(levels) => {
                if self.read_failing {
                    tracing::info!("Button reads recovered");
                    self.read_failing = false;
                }
                levels
            }
            Err(err) => {
                if !self.read_failing {
                    tracing::warn!(error = %err, "Button read failed; treating as released");
                    self.read_failing = true;
                }
                ButtonLevels::default()
            }
        };

        if levels.is_shutdown_gesture() {
            self.streak += 1;
        } else {
            self.streak = 0;
        }

        if self.streak >= self.confirm_samples {
            tracing::info!(samples = self.streak, "Shutdown gesture detected");
            self.latched = true;
        }
        self.latched
    }

    pub fn is_requested(&self) -> bool {
        self.latched
    }

    /// True while the most recent read failed.
    pub fn is_read_failing(&self) -> bool {
        self.read_failing
    }
}
