//! The two miniPiTFT push buttons, read through the GPIO character device.

use linux_embedded_hal::gpio_cdev::{Chip, LineHandle, LineRequestFlags};

use monitor_core::config::ButtonsConfig;
use monitor_core::{ButtonLevels, ButtonSource, MonitorError, Result};

pub struct GpioButtons {
    lower: LineHandle,
    upper: LineHandle,
    active_low: bool,
}

impl GpioButtons {
    /// Claims both lines as inputs. The board's pull-ups keep them high
    /// while released.
    pub fn open(config: &ButtonsConfig) -> Result<Self> {
        let mut chip = Chip::new(&config.chip).map_err(|err| {
            MonitorError::Buttons(format!("opening {}: {}", config.chip.display(), err))
        })?;
        let lower = input_line(&mut chip, config.lower_pin, "trainer-monitor-lower")?;
        let upper = input_line(&mut chip, config.upper_pin, "trainer-monitor-upper")?;

        tracing::info!(
            lower = config.lower_pin,
            upper = config.upper_pin,
            active_low = config.active_low,
            "Buttons ready"
        );
        Ok(Self {
            lower,
            upper,
            active_low: config.active_low,
        })
    }
}

impl ButtonSource for GpioButtons {
    fn read(&mut self) -> Result<ButtonLevels> {
        let lower = read_level(&self.lower)?;
        let upper = read_level(&self.upper)?;
        Ok(ButtonLevels::from_raw(lower, upper, self.active_low))
    }
}

fn input_line(chip: &mut Chip, pin: u32, consumer: &str) -> Result<LineHandle> {
    chip.get_line(pin)
        .and_then(|line| line.request(LineRequestFlags::INPUT, 0, consumer))
        .map_err(|err| MonitorError::Buttons(format!("requesting GPIO {}: {}", pin, err)))
}

fn read_level(handle: &LineHandle) -> Result<bool> {
    handle
        .get_value()
        .map(|value| value != 0)
        .map_err(|err| MonitorError::Buttons(format!("reading GPIO {}: {}", handle.line().offset(), err)))
}
