use embedded_hal::digital::InputPin;

/// Microsecond timestamp, the same resolution as the RP2040 timer
pub type Instant = fugit::TimerInstantU64<1_000_000>;

/// Microsecond duration
pub type Duration = fugit::MicrosDurationU64;

/// A free-running monotonic clock.
pub trait Clock {
    /// Current time since an arbitrary epoch
    fn now(&self) -> Instant;
}

/// Outcome of waiting for a line to reach a level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// The level was observed; holds the poll timestamp that saw it
    Detected(Instant),
    /// The deadline passed first; holds the last poll timestamp
    TimedOut(Instant),
}

impl Edge {
    /// The timestamp attached to the outcome, best-effort for a timeout
    pub fn at(&self) -> Instant {
        match *self {
            Edge::Detected(at) | Edge::TimedOut(at) => at,
        }
    }

    pub fn timed_out(&self) -> bool {
        matches!(self, Edge::TimedOut(_))
    }
}

/// Deadline tracks a bounded wait started at a given instant
pub struct Deadline {
    started: Instant,
    timeout: Duration,
}

impl Deadline {
    pub fn start(now: Instant, timeout: Duration) -> Deadline {
        Self {
            started: now,
            timeout,
        }
    }

    /// A deadline has expired once strictly more than `timeout` has elapsed
    pub fn is_expired(&self, now: Instant) -> bool {
        match now.checked_duration_since(self.started) {
            Some(elapsed) => elapsed > self.timeout,
            None => false,
        }
    }
}

/// Polls a line until it reads the wanted level or the timeout expires
/// param pin: the line to poll
/// param clock: monotonic clock
/// param high: the level to wait for
/// param timeout: longest time to keep polling
/// returns the edge outcome; only pin read errors are propagated
pub fn wait_for_level<P, C>(
    pin: &mut P,
    clock: &C,
    high: bool,
    timeout: Duration,
) -> Result<Edge, P::Error>
where
    P: InputPin + ?Sized,
    C: Clock + ?Sized,
{
    let deadline = Deadline::start(clock.now(), timeout);
    loop {
        let now = clock.now();
        if pin.is_high()? == high {
            return Ok(Edge::Detected(now));
        }
        if deadline.is_expired(now) {
            return Ok(Edge::TimedOut(now));
        }
    }
}
