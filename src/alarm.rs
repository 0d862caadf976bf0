use embedded_hal::digital::OutputPin;

use crate::fixed::Hundredths;
use crate::ranging::DistanceReading;

/// Whether a reading is close enough to sound the alarm
/// param reading: classified distance
/// param threshold: inclusive alarm distance
pub fn alarm_required(reading: &DistanceReading, threshold: Hundredths) -> bool {
    matches!(reading, DistanceReading::Detected(d) if *d <= threshold)
}

/// The buzzer, remembering what it was last told
pub struct Alarm<P: OutputPin> {
    buzzer: P,
    sounding: bool,
}

impl<P: OutputPin> Alarm<P> {
    pub fn new(buzzer: P) -> Self {
        Self {
            buzzer,
            sounding: false,
        }
    }

    /// Drives the buzzer
    /// param on: whether it should sound
    pub fn set(&mut self, on: bool) -> Result<(), P::Error> {
        if on {
            self.buzzer.set_high()?;
        } else {
            self.buzzer.set_low()?;
        }
        self.sounding = on;
        Ok(())
    }

    /// Applies the alarm policy to a fresh reading
    /// returns whether the alarm is now sounding
    pub fn update(&mut self, reading: &DistanceReading, threshold: Hundredths) -> Result<bool, P::Error> {
        let on = alarm_required(reading, threshold);
        self.set(on)?;
        Ok(on)
    }

    pub fn silence(&mut self) -> Result<(), P::Error> {
        self.set(false)
    }

    pub fn is_sounding(&self) -> bool {
        self.sounding
    }

    pub fn release(self) -> P {
        self.buzzer
    }
}
