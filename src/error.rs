use embedded_hal::digital::ErrorKind;

/// Faults that end the monitor loop.
///
/// Echo timeouts and climate read failures are not here: they degrade a
/// single reading and the loop carries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MonitorError {
    /// A GPIO line (echo, button or buzzer) reported an error.
    #[error("GPIO error: {0:?}")]
    Gpio(ErrorKind),

    /// The character display rejected a command.
    #[error("display error")]
    Display,

    /// The time-series sink failed to accept a point.
    #[error("time-series sink error")]
    Sink,

    /// A text line did not fit its buffer.
    #[error("text does not fit buffer")]
    Format,
}

impl MonitorError {
    /// Maps any embedded-hal digital error onto a [`MonitorError::Gpio`]
    pub fn gpio<E: embedded_hal::digital::Error>(e: E) -> Self {
        MonitorError::Gpio(e.kind())
    }
}
