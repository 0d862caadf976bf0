//! Ultrasonic time-of-flight ranging on a single trigger/echo line

use embedded_hal::delay::DelayNs;

use crate::config::MonitorConfig;
use crate::fixed::{div_round, Hundredths};
use crate::macros::{log_debug, log_warn};
use crate::pin::{EchoListener, FlexPin, PinMode};
use crate::timer::{wait_for_level, Clock, Duration, Edge};

/// Half the speed of sound in cm/s; the echo covers the distance twice
pub const HALF_SPEED_OF_SOUND_CM_S: i64 = 17_150;

/// Converts an echo pulse width into a distance
/// param pulse_us: signed pulse width in microseconds
/// returns the distance in hundredths of a centimeter, rounded half away from zero
pub fn pulse_to_distance(pulse_us: i64) -> Hundredths {
    // us * 17150 cm/s * 100 / 1_000_000 us/s
    let hundredths = div_round(pulse_us.saturating_mul(HALF_SPEED_OF_SOUND_CM_S), 10_000);
    Hundredths(hundredths.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
}

/// Result of classifying a distance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DistanceReading {
    /// Something is in range at this distance (cm)
    Detected(Hundredths),
    /// Nothing in range, or the measurement could not be trusted
    NoTarget,
}

impl DistanceReading {
    /// A distance is valid iff `0 < distance < max_range`
    /// param distance: computed distance in cm
    /// param max_range: exclusive upper bound
    pub fn classify(distance: Hundredths, max_range: Hundredths) -> Self {
        if distance > Hundredths::ZERO && distance < max_range {
            DistanceReading::Detected(distance)
        } else {
            DistanceReading::NoTarget
        }
    }

    pub fn distance(&self) -> Option<Hundredths> {
        match *self {
            DistanceReading::Detected(d) => Some(d),
            DistanceReading::NoTarget => None,
        }
    }
}

/// Everything observed during one trigger/echo cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RangeSample {
    pub start: Edge,
    pub end: Edge,
    /// Best-effort pulse width; may be zero or negative after a timeout
    pub pulse_us: i64,
    pub distance: Hundredths,
}

impl RangeSample {
    /// Builds a sample from the two edge outcomes
    pub fn from_edges(start: Edge, end: Edge) -> Self {
        let pulse_us = end.at().ticks() as i64 - start.at().ticks() as i64;
        Self {
            start,
            end,
            pulse_us,
            distance: pulse_to_distance(pulse_us),
        }
    }

    /// Whether either echo edge timed out
    pub fn is_degraded(&self) -> bool {
        self.start.timed_out() || self.end.timed_out()
    }

    /// Classifies the sample. Degraded samples never count as a detection,
    /// whatever distance their best-effort timestamps produce: a missed echo
    /// start leaves a near-zero width that would otherwise trip the alarm,
    /// and a stuck-high echo would read as a target at the timeout distance.
    /// param max_range: exclusive upper bound of a valid distance
    pub fn reading(&self, max_range: Hundredths) -> DistanceReading {
        if self.is_degraded() {
            DistanceReading::NoTarget
        } else {
            DistanceReading::classify(self.distance, max_range)
        }
    }
}

/// Drives one ultrasonic module over a single bidirectional line.
pub struct RangeSampler<P: FlexPin> {
    line: P,
    quiescence_ms: u32,
    trigger_pulse_us: u32,
    echo_timeout: Duration,
}

impl<P: FlexPin> RangeSampler<P> {
    /// Takes ownership of the trigger/echo line
    /// param line: trigger/echo line
    /// param config: timing source
    pub fn new(line: P, config: &MonitorConfig) -> Self {
        Self {
            line,
            quiescence_ms: config.quiescence_ms,
            trigger_pulse_us: config.trigger_pulse_us,
            echo_timeout: Duration::micros(config.echo_timeout_us as u64),
        }
    }

    /// Runs one full trigger/echo cycle.
    /// Edge timeouts are logged and reported in the sample, never returned as errors.
    /// param delay: blocking delay provider
    /// param clock: monotonic clock
    /// returns the sample, or the line's error if it could not be driven or read
    pub fn sample<D, C>(&mut self, delay: &mut D, clock: &C) -> Result<RangeSample, P::Error>
    where
        D: DelayNs,
        C: Clock,
    {
        // Quiescence, then the trigger pulse
        self.line.set_low()?;
        delay.delay_ms(self.quiescence_ms);
        self.line.set_high()?;
        delay.delay_us(self.trigger_pulse_us);
        self.line.set_low()?;

        let mut listener = EchoListener::listen(&mut self.line)?;

        let start = wait_for_level(listener.line(), clock, true, self.echo_timeout)?;
        if start.timed_out() {
            log_warn!("Timed out waiting for echo start");
        }
        let end = wait_for_level(listener.line(), clock, false, self.echo_timeout)?;
        if end.timed_out() {
            log_warn!("Timed out waiting for echo end");
        }
        drop(listener);

        let sample = RangeSample::from_edges(start, end);
        log_debug!("echo pulse: {} us", sample.pulse_us);
        Ok(sample)
    }

    /// Parks the line as an output driven low
    pub fn park(&mut self) -> Result<(), P::Error> {
        self.line.set_mode(PinMode::Output)?;
        self.line.set_low()
    }

    /// Gives the line back
    pub fn release(self) -> P {
        self.line
    }
}
