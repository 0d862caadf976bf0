use bme680::{Bme680, FieldDataCondition, PowerMode};
use embedded_hal::delay::DelayNs;
use embedded_hal_0_2::blocking::delay::DelayMs;
use embedded_hal_0_2::blocking::i2c::{Read, Write};

use crate::fixed::Hundredths;
use crate::macros::{log_debug, log_warn};

/// Temperature and humidity, each absent when the sensor failed to report it
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClimateReading {
    /// Degrees Celsius
    pub temperature: Option<Hundredths>,
    /// Relative humidity percentage
    pub humidity: Option<Hundredths>,
}

impl ClimateReading {
    pub const EMPTY: ClimateReading = ClimateReading {
        temperature: None,
        humidity: None,
    };

    pub fn new(temperature: Hundredths, humidity: Hundredths) -> Self {
        Self {
            temperature: Some(temperature),
            humidity: Some(humidity),
        }
    }

    /// Both values, if both were read
    pub fn complete(&self) -> Option<(Hundredths, Hundredths)> {
        match (self.temperature, self.humidity) {
            (Some(t), Some(h)) => Some((t, h)),
            _ => None,
        }
    }
}

/// Port for a temperature/humidity sensor.
pub trait ClimateSensor {
    /// Takes a single reading; missing values mean the sensor did not answer
    fn read(&mut self) -> ClimateReading;
}

/// Reads the sensor until both values arrive or attempts run out
/// param sensor: climate sensor
/// param delay: delay used between attempts
/// param attempts: maximum number of reads, at least one is always made
/// param retry_ms: pause between attempts
/// returns the first complete reading, or the last attempt's partial one
pub fn read_with_retry<S, D>(
    sensor: &mut S,
    delay: &mut D,
    attempts: u8,
    retry_ms: u32,
) -> ClimateReading
where
    S: ClimateSensor + ?Sized,
    D: DelayNs,
{
    let attempts = attempts.max(1);
    let mut reading = ClimateReading::EMPTY;
    for attempt in 1..=attempts {
        reading = sensor.read();
        if reading.complete().is_some() {
            log_debug!("climate read after {} attempt(s)", attempt);
            return reading;
        }
        if attempt < attempts {
            delay.delay_ms(retry_ms);
        }
    }
    log_warn!("climate sensor gave no data after {} attempts", attempts);
    reading
}

/// BME680 over I2C, answering as a [`ClimateSensor`]
///
/// The driver is written against the embedded-hal 0.2 blocking traits, so
/// the bus and delay are bound on those rather than the 1.0 ones.
pub struct Bme680Climate<I2C, D> {
    bme: Bme680<I2C, D>,
    delay: D,
}

impl<I2C, D> Bme680Climate<I2C, D>
where
    I2C: Read + Write,
    D: DelayMs<u8>,
{
    /// Wraps an initialised sensor
    /// param bme: BME sensor instance, settings already applied
    /// param delay: BME sensor delay
    pub fn new(bme: Bme680<I2C, D>, delay: D) -> Self {
        Self { bme, delay }
    }
}

impl<I2C, D> ClimateSensor for Bme680Climate<I2C, D>
where
    I2C: Read + Write,
    D: DelayMs<u8>,
{
    /// Puts the sensor in forced mode and fetches one measurement.
    /// Stale data counts as a failed read.
    fn read(&mut self) -> ClimateReading {
        if self
            .bme
            .set_sensor_mode(&mut self.delay, PowerMode::ForcedMode)
            .is_err()
        {
            log_warn!("BME680 refused forced mode");
            return ClimateReading::EMPTY;
        }
        match self.bme.get_sensor_data(&mut self.delay) {
            Ok((_, FieldDataCondition::Unchanged)) => ClimateReading::EMPTY,
            Ok((data, _)) => ClimateReading::new(
                Hundredths::from_f32(data.temperature_celsius()),
                Hundredths::from_f32(data.humidity_percent()),
            ),
            Err(_) => {
                log_warn!("BME680 read failed");
                ClimateReading::EMPTY
            }
        }
    }
}
