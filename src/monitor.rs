//! The monitor loop: one owner for every peripheral and the RANGING /
//! CLIMATE_READ state machine.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::alarm::Alarm;
use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::macros::{log_error, log_info, log_warn};
use crate::pin::FlexPin;
use crate::ranging::{DistanceReading, RangeSampler};
use crate::rendering::{
    render_climate, render_distance, render_screen, CharacterDisplay, BANNER, CLIMATE_ERROR,
    FAULT, NO_TARGET, READING_CLIMATE, STOPPED,
};
use crate::sensors::{read_with_retry, ClimateReading, ClimateSensor};
use crate::telemetry::{Point, TimeSeriesSink};
use crate::timer::Clock;

/// What the loop is doing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Measuring distance every cycle
    #[default]
    Ranging,
    /// A climate reading was taken for the current button press; waiting for release
    ClimateRead,
}

/// Why the loop ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Shutdown {
    Requested,
    Fault,
}

/// What a single loop iteration did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// A ranging cycle ran
    Ranged(DistanceReading),
    /// The button was pressed and the climate sensor was read
    ClimateRead(ClimateReading),
    /// Still waiting for the button to be released
    Held,
    /// The button was released, ranging resumes next iteration
    Resumed,
}

/// Every peripheral the monitor owns
pub struct Peripherals<E, B, Z, L, S, K, D, C> {
    /// Shared trigger/echo line of the ultrasonic module
    pub echo: E,
    /// Push button, active-low
    pub button: B,
    /// Buzzer output
    pub buzzer: Z,
    pub display: L,
    pub climate: S,
    pub sink: K,
    pub delay: D,
    pub clock: C,
}

/// Session state carried across loop iterations
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Session {
    pub mode: Mode,
    pub cycles: u32,
    pub climate_reads: u32,
}

/// The monitor owns the hardware and runs the control loop.
pub struct Monitor<E, B, Z, L, S, K, D, C>
where
    E: FlexPin,
    Z: OutputPin,
{
    sampler: RangeSampler<E>,
    button: B,
    alarm: Alarm<Z>,
    display: L,
    climate: S,
    sink: K,
    delay: D,
    clock: C,
    config: MonitorConfig,
    session: Session,
}

impl<E, B, Z, L, S, K, D, C> Monitor<E, B, Z, L, S, K, D, C>
where
    E: FlexPin,
    B: InputPin,
    Z: OutputPin,
    L: CharacterDisplay,
    S: ClimateSensor,
    K: TimeSeriesSink,
    D: DelayNs,
    C: Clock,
{
    pub fn new(hw: Peripherals<E, B, Z, L, S, K, D, C>, config: MonitorConfig) -> Self {
        Self {
            sampler: RangeSampler::new(hw.echo, &config),
            button: hw.button,
            alarm: Alarm::new(hw.buzzer),
            display: hw.display,
            climate: hw.climate,
            sink: hw.sink,
            delay: hw.delay,
            clock: hw.clock,
            config,
            session: Session::default(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn alarm_sounding(&self) -> bool {
        self.alarm.is_sounding()
    }

    pub fn display(&self) -> &L {
        &self.display
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Parks the outputs and shows the startup banner
    pub fn start(&mut self) -> Result<(), MonitorError> {
        log_info!("System started");
        self.alarm.silence().map_err(MonitorError::gpio)?;
        self.sampler.park().map_err(MonitorError::gpio)?;
        render_screen(BANNER, true, &mut self.display)?;
        self.delay.delay_ms(self.config.banner_ms);
        self.display.clear().map_err(|_| MonitorError::Display)
    }

    /// Runs until `stop_requested` returns true or a fault occurs,
    /// then shuts down either way
    /// param stop_requested: polled once per iteration
    /// returns the fault that ended the loop, if any
    pub fn run<F: FnMut() -> bool>(&mut self, mut stop_requested: F) -> Result<(), MonitorError> {
        let outcome = self.start().and_then(|_| {
            while !stop_requested() {
                self.tick()?;
            }
            Ok(())
        });
        match outcome {
            Ok(()) => {
                self.shutdown(Shutdown::Requested);
                Ok(())
            }
            Err(e) => {
                log_error!("Monitor fault: {}", e);
                self.shutdown(Shutdown::Fault);
                Err(e)
            }
        }
    }

    /// One loop iteration
    pub fn tick(&mut self) -> Result<Step, MonitorError> {
        let pressed = self.button.is_low().map_err(MonitorError::gpio)?;
        match (self.session.mode, pressed) {
            (Mode::Ranging, false) => self.range_cycle().map(Step::Ranged),
            (Mode::Ranging, true) => self.climate_read().map(Step::ClimateRead),
            (Mode::ClimateRead, true) => {
                self.delay.delay_ms(self.config.button_poll_ms);
                Ok(Step::Held)
            }
            (Mode::ClimateRead, false) => {
                log_info!("Button released, ranging resumed");
                self.session.mode = Mode::Ranging;
                Ok(Step::Resumed)
            }
        }
    }

    /// Sample, drive the alarm, render, persist, rest.
    /// The point is written last so a sink fault never holds back the alarm.
    fn range_cycle(&mut self) -> Result<DistanceReading, MonitorError> {
        let sample = self
            .sampler
            .sample(&mut self.delay, &self.clock)
            .map_err(MonitorError::gpio)?;
        let reading = sample.reading(self.config.max_range);
        self.session.cycles = self.session.cycles.wrapping_add(1);

        match reading {
            DistanceReading::Detected(distance) => {
                log_info!("Distance: {} cm", distance);
                let alarm = self
                    .alarm
                    .update(&reading, self.config.alarm_threshold)
                    .map_err(MonitorError::gpio)?;
                if alarm {
                    log_warn!("INTRUDER ALERT at {} cm", distance);
                }
                render_distance(distance, alarm, &mut self.display)?;
                self.sink
                    .write_point(&Point::distance(distance))
                    .map_err(|_| MonitorError::Sink)?;
            }
            DistanceReading::NoTarget => {
                log_info!("No target");
                render_screen(NO_TARGET, true, &mut self.display)?;
                self.alarm.silence().map_err(MonitorError::gpio)?;
            }
        }

        self.delay.delay_ms(self.config.cycle_rest_ms);
        Ok(reading)
    }

    /// Entered once per button press: silence, read, render, persist, hold
    fn climate_read(&mut self) -> Result<ClimateReading, MonitorError> {
        self.session.mode = Mode::ClimateRead;
        self.session.climate_reads = self.session.climate_reads.wrapping_add(1);
        self.alarm.silence().map_err(MonitorError::gpio)?;
        log_info!("Reading temperature and humidity...");
        render_screen(READING_CLIMATE, true, &mut self.display)?;

        let reading = read_with_retry(
            &mut self.climate,
            &mut self.delay,
            self.config.climate_attempts,
            self.config.climate_retry_ms,
        );
        match reading.complete() {
            Some((temperature, humidity)) => {
                log_info!("Temperature: {} C, humidity: {} %", temperature, humidity);
                render_climate(temperature, humidity, &mut self.display)?;
                self.sink
                    .write_point(&Point::climate(temperature, humidity))
                    .map_err(|_| MonitorError::Sink)?;
            }
            None => {
                log_warn!("Failed to read temperature and humidity");
                render_screen(CLIMATE_ERROR, true, &mut self.display)?;
            }
        }

        self.delay.delay_ms(self.config.climate_hold_ms);
        Ok(reading)
    }

    /// Best-effort cleanup: buzzer off, echo line parked, final message shown.
    /// Errors are logged and skipped so every step gets its chance.
    pub fn shutdown(&mut self, reason: Shutdown) {
        if self.alarm.silence().is_err() {
            log_error!("Could not silence the buzzer");
        }
        if self.sampler.park().is_err() {
            log_error!("Could not park the echo line");
        }
        let message = match reason {
            Shutdown::Requested => STOPPED,
            Shutdown::Fault => FAULT,
        };
        if render_screen(message, true, &mut self.display).is_err() {
            log_error!("Could not show shutdown message");
        }
        log_info!("{}", message);
    }
}
