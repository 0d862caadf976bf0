//! Host-side fakes for the hardware ports
//!
//! Pins, delay and display share one simulated microsecond clock so that
//! echo timing can be scripted.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::string::{String, ToString};
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};
use embedded_hal_0_2::blocking::delay::DelayMs;
use embedded_hal_0_2::blocking::i2c;

use crate::pin::{FlexPin, PinMode};
use crate::rendering::CharacterDisplay;
use crate::sensors::{ClimateReading, ClimateSensor};
use crate::telemetry::{Point, TimeSeriesSink};
use crate::timer::{Clock, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeGpioError;

impl digital::Error for FakeGpioError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Simulated clock; every `now()` advances it by `step` microseconds first,
/// standing in for the time a poll takes.
#[derive(Clone)]
pub struct FakeClock {
    now: Rc<Cell<u64>>,
    step: u64,
}

impl FakeClock {
    pub fn new(step: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(0)),
            step,
        }
    }

    /// Current time without advancing
    pub fn peek(&self) -> u64 {
        self.now.get()
    }

    pub fn advance(&self, us: u64) {
        self.now.set(self.now.get() + us);
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.advance(self.step);
        Instant::from_ticks(self.now.get())
    }
}

/// Delay that moves the simulated clock forward
pub struct FakeDelay {
    clock: FakeClock,
}

impl FakeDelay {
    pub fn new(clock: &FakeClock) -> Self {
        Self {
            clock: clock.clone(),
        }
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.advance((ns as u64).div_ceil(1000));
    }

    fn delay_us(&mut self, us: u32) {
        self.clock.advance(us as u64);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.advance(ms as u64 * 1000);
    }
}

impl DelayMs<u8> for FakeDelay {
    fn delay_ms(&mut self, ms: u8) {
        self.clock.advance(ms as u64 * 1000);
    }
}

/// The shared trigger/echo line with a scripted ultrasonic module on the other end.
///
/// Each time the line is released to input mode the module answers with a
/// pulse that rises `echo_delay` after release and lasts `echo_width`.
pub struct ScriptedLine {
    clock: FakeClock,
    mode: PinMode,
    driven_high: bool,
    released_at: u64,
    echo: Option<(u64, u64)>,
    mode_switches: u32,
    last_rise: Option<u64>,
    trigger: Option<(u64, u64)>,
}

impl ScriptedLine {
    pub fn new(clock: &FakeClock) -> Self {
        Self {
            clock: clock.clone(),
            mode: PinMode::Output,
            driven_high: false,
            released_at: 0,
            echo: None,
            mode_switches: 0,
            last_rise: None,
            trigger: None,
        }
    }

    pub fn with_echo(mut self, echo_delay: u64, echo_width: u64) -> Self {
        self.echo = Some((echo_delay, echo_width));
        self
    }

    /// Switches to input as of now
    pub fn release(&mut self) {
        self.mode = PinMode::Input;
        self.released_at = self.clock.peek();
    }

    pub fn mode(&self) -> PinMode {
        self.mode
    }

    pub fn driven_high(&self) -> bool {
        self.driven_high
    }

    pub fn mode_switches(&self) -> u32 {
        self.mode_switches
    }

    /// Timestamps of the last complete high pulse driven in output mode
    pub fn trigger_pulse(&self) -> Option<(u64, u64)> {
        self.trigger
    }

    fn echo_high(&self) -> bool {
        match self.echo {
            Some((delay, width)) => {
                let since = self.clock.peek().saturating_sub(self.released_at);
                since >= delay && since < delay + width
            }
            None => false,
        }
    }
}

impl ErrorType for ScriptedLine {
    type Error = core::convert::Infallible;
}

impl InputPin for ScriptedLine {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(match self.mode {
            PinMode::Input => self.echo_high(),
            PinMode::Output => self.driven_high,
        })
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.is_high()?)
    }
}

impl OutputPin for ScriptedLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.driven_high && self.mode == PinMode::Output {
            if let Some(rise) = self.last_rise.take() {
                self.trigger = Some((rise, self.clock.peek()));
            }
        }
        self.driven_high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.driven_high && self.mode == PinMode::Output {
            self.last_rise = Some(self.clock.peek());
        }
        self.driven_high = true;
        Ok(())
    }
}

impl FlexPin for ScriptedLine {
    fn set_mode(&mut self, mode: PinMode) -> Result<(), Self::Error> {
        self.mode_switches += 1;
        match mode {
            PinMode::Input => self.release(),
            PinMode::Output => self.mode = PinMode::Output,
        }
        Ok(())
    }
}

#[derive(Default)]
struct OutputState {
    on: Cell<bool>,
    writes: Cell<u32>,
}

/// Output pin whose clones share state, so tests can watch a pin the monitor owns
#[derive(Clone, Default)]
pub struct FakeOutput {
    state: Rc<OutputState>,
}

impl FakeOutput {
    pub fn is_on(&self) -> bool {
        self.state.on.get()
    }

    pub fn writes(&self) -> u32 {
        self.state.writes.get()
    }

    /// Sets the level behind the owner's back
    pub fn force(&self, on: bool) {
        self.state.on.set(on);
    }

    fn write(&self, on: bool) {
        self.state.on.set(on);
        self.state.writes.set(self.state.writes.get() + 1);
    }
}

impl ErrorType for FakeOutput {
    type Error = core::convert::Infallible;
}

impl OutputPin for FakeOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true);
        Ok(())
    }
}

/// Input pin whose clones share state
#[derive(Clone)]
pub struct FakeInput {
    high: Rc<Cell<bool>>,
    broken: Rc<Cell<bool>>,
}

impl FakeInput {
    pub fn new(high: bool) -> Self {
        Self {
            high: Rc::new(Cell::new(high)),
            broken: Rc::new(Cell::new(false)),
        }
    }

    pub fn set(&self, high: bool) {
        self.high.set(high);
    }

    /// Makes every following read fail
    pub fn fail(&self) {
        self.broken.set(true);
    }
}

impl ErrorType for FakeInput {
    type Error = FakeGpioError;
}

impl InputPin for FakeInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        if self.broken.get() {
            return Err(FakeGpioError);
        }
        Ok(self.high.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.is_high()?)
    }
}

/// Two-row display that remembers what is on screen and everything ever written
#[derive(Default)]
pub struct FakeDisplay {
    rows: [String; 2],
    history: Vec<String>,
    clears: u32,
    broken: bool,
}

impl FakeDisplay {
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn rows(&self) -> [&str; 2] {
        [self.rows[0].as_str(), self.rows[1].as_str()]
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn clears(&self) -> u32 {
        self.clears
    }
}

impl CharacterDisplay for FakeDisplay {
    type Error = ();

    fn clear(&mut self) -> Result<(), Self::Error> {
        if self.broken {
            return Err(());
        }
        self.rows = Default::default();
        self.clears += 1;
        Ok(())
    }

    fn write_line(&mut self, row: u8, text: &str) -> Result<(), Self::Error> {
        if self.broken || row > 1 {
            return Err(());
        }
        self.rows[row as usize] = text.to_string();
        self.history.push(text.to_string());
        Ok(())
    }
}

/// Climate sensor replaying scripted readings, then failing
pub struct FakeClimate {
    script: VecDeque<ClimateReading>,
    reads: u32,
}

impl FakeClimate {
    pub fn new<I: IntoIterator<Item = ClimateReading>>(readings: I) -> Self {
        Self {
            script: readings.into_iter().collect(),
            reads: 0,
        }
    }

    pub fn failing() -> Self {
        Self::new([])
    }

    pub fn reads(&self) -> u32 {
        self.reads
    }
}

impl ClimateSensor for FakeClimate {
    fn read(&mut self) -> ClimateReading {
        self.reads += 1;
        self.script.pop_front().unwrap_or(ClimateReading::EMPTY)
    }
}

/// Sink keeping every point
#[derive(Default)]
pub struct RecordingSink {
    points: Vec<Point>,
    broken: bool,
}

impl RecordingSink {
    /// A sink rejecting every write
    pub fn failing() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }
}

impl TimeSeriesSink for RecordingSink {
    type Error = ();

    fn write_point(&mut self, point: &Point) -> Result<(), Self::Error> {
        if self.broken {
            return Err(());
        }
        self.points.push(point.clone());
        Ok(())
    }
}

#[derive(Default)]
struct BusState {
    regs: RefCell<Vec<u8>>,
    pointer: Cell<u8>,
    broken: Cell<bool>,
}

/// I2C bus with a BME680 register file on the other end.
///
/// A write sets the register pointer from its first byte and stores the
/// rest from there; a read returns bytes from the pointer onwards.
/// Clones share the register file.
#[derive(Clone)]
pub struct FakeBme680Bus {
    state: Rc<BusState>,
}

impl FakeBme680Bus {
    pub const CHIP_ID_REG: u8 = 0xd0;
    pub const CHIP_ID: u8 = 0x61;
    pub const MODE_REG: u8 = 0x74;
    pub const FIELD0_REG: u8 = 0x1d;

    /// A bus answering with the right chip id and an empty register file
    pub fn new() -> Self {
        let bus = Self {
            state: Rc::new(BusState {
                regs: RefCell::new(vec![0; 256]),
                ..BusState::default()
            }),
        };
        bus.poke(Self::CHIP_ID_REG, &[Self::CHIP_ID]);
        bus
    }

    pub fn poke(&self, reg: u8, bytes: &[u8]) {
        let mut regs = self.state.regs.borrow_mut();
        for (i, byte) in bytes.iter().enumerate() {
            regs[(reg as usize + i) % 256] = *byte;
        }
    }

    pub fn peek(&self, reg: u8) -> u8 {
        self.state.regs.borrow()[reg as usize]
    }

    /// Makes every following transfer fail
    pub fn fail(&self) {
        self.state.broken.set(true);
    }
}

impl Default for FakeBme680Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl i2c::Write for FakeBme680Bus {
    type Error = ();

    fn write(&mut self, _address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        if self.state.broken.get() {
            return Err(());
        }
        if let Some((reg, data)) = bytes.split_first() {
            self.state.pointer.set(*reg);
            self.poke(*reg, data);
        }
        Ok(())
    }
}

impl i2c::Read for FakeBme680Bus {
    type Error = ();

    fn read(&mut self, _address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        if self.state.broken.get() {
            return Err(());
        }
        let regs = self.state.regs.borrow();
        let start = self.state.pointer.get() as usize;
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = regs[(start + i) % 256];
        }
        Ok(())
    }
}
