//! ST7789 240x240 panel (Adafruit miniPiTFT) over spidev + GPIO character device.

use embedded_graphics::{
    mono_font::{ascii::FONT_10X20, MonoTextStyle},
    pixelcolor::{Rgb565, Rgb888},
    prelude::*,
    text::{Baseline, Text},
};
use display_interface_spi::SPIInterface;
use linux_embedded_hal::{
    gpio_cdev::{Chip, LineRequestFlags},
    spidev::{SpiModeFlags, SpidevOptions},
    CdevPin, Delay, SpidevDevice,
};
use mipidsi::{models::ST7789, options::ColorInversion, Builder, Display, NoResetPin};

use monitor_core::config::DisplayConfig;
use monitor_core::{Color, DisplaySink, MonitorError, RenderRequest, Result, Row};

const TEXT_X: i32 = 0;

type Panel = Display<SPIInterface<SpidevDevice, CdevPin>, ST7789, NoResetPin>;

pub struct St7789Panel {
    display: Panel,
    // Held so the backlight line stays requested (and lit) for the process lifetime.
    _backlight: CdevPin,
}

impl St7789Panel {
    pub fn open(config: &DisplayConfig, chip_path: &std::path::Path) -> Result<Self> {
        let mut spi = SpidevDevice::open(&config.spi_device)
            .map_err(|err| display_error("opening SPI device", err))?;
        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(config.spi_hz)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        spi.configure(&options)
            .map_err(|err| display_error("configuring SPI", err))?;

        let mut chip = Chip::new(chip_path).map_err(|err| display_error("opening GPIO chip", err))?;
        let dc = output_pin(&mut chip, config.dc_pin, 0, "trainer-monitor-dc")?;
        let backlight = output_pin(&mut chip, config.backlight_pin, 1, "trainer-monitor-bl")?;

        let mut delay = Delay {};
        let display = Builder::new(ST7789, SPIInterface::new(spi, dc))
            .display_size(config.width, config.height)
            .display_offset(config.offset_x, config.offset_y)
            .invert_colors(ColorInversion::Inverted)
            .init(&mut delay)
            .map_err(|err| MonitorError::Display(format!("panel init failed: {:?}", err)))?;

        tracing::info!(
            spi = %config.spi_device.display(),
            width = config.width,
            height = config.height,
            "Panel initialized"
        );

        Ok(Self {
            display,
            _backlight: backlight,
        })
    }
}

impl DisplaySink for St7789Panel {
    fn present(&mut self, request: &RenderRequest) -> Result<()> {
        self.display
            .clear(Rgb565::BLACK)
            .map_err(|err| MonitorError::Display(format!("clear failed: {:?}", err)))?;

        for row in Row::ALL {
            let line = request.line(row);
            let style = MonoTextStyle::new(&FONT_10X20, to_rgb565(line.color));
            Text::with_baseline(
                &line.text,
                Point::new(TEXT_X, row.y_offset()),
                style,
                Baseline::Top,
            )
            .draw(&mut self.display)
            .map_err(|err| MonitorError::Display(format!("draw failed: {:?}", err)))?;
        }
        Ok(())
    }
}

fn to_rgb565(color: Color) -> Rgb565 {
    Rgb888::new(color.r, color.g, color.b).into()
}

fn output_pin(chip: &mut Chip, pin: u32, initial: u8, consumer: &str) -> Result<CdevPin> {
    let handle = chip
        .get_line(pin)
        .and_then(|line| line.request(LineRequestFlags::OUTPUT, initial, consumer))
        .map_err(|err| display_error(&format!("requesting GPIO {}", pin), err))?;
    CdevPin::new(handle).map_err(|err| display_error(&format!("configuring GPIO {}", pin), err))
}

fn display_error(context: &str, err: impl std::fmt::Display) -> MonitorError {
    MonitorError::Display(format!("{}: {}", context, err))
}
