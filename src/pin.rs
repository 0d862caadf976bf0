//! Bidirectional pin handling for the shared trigger/echo line
//!
//! The ultrasonic module uses one wire for both the trigger pulse and the
//! echo. The line idles as an output driven low; it is switched to an input
//! only while an echo is being timed, and [`EchoListener`] switches it back
//! when it goes out of scope, whatever path the measurement takes.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::macros::log_warn;

/// Direction of a bidirectional line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    Output,
    Input,
}

/// A GPIO line that can be switched between driving and sensing at runtime.
pub trait FlexPin: InputPin + OutputPin {
    /// Reconfigure the line direction
    /// param mode: the direction to switch to
    fn set_mode(&mut self, mode: PinMode) -> Result<(), Self::Error>;
}

/// Holds a [`FlexPin`] in input mode for as long as it lives.
///
/// Dropping the listener returns the line to output mode and drives it low.
pub struct EchoListener<'a, P: FlexPin> {
    pin: &'a mut P,
}

impl<'a, P: FlexPin> EchoListener<'a, P> {
    /// Switches the line to input mode
    /// param pin: line to listen on
    pub fn listen(pin: &'a mut P) -> Result<Self, P::Error> {
        pin.set_mode(PinMode::Input)?;
        Ok(Self { pin })
    }

    /// The line, readable as an input
    pub fn line(&mut self) -> &mut P {
        self.pin
    }
}

impl<P: FlexPin> Drop for EchoListener<'_, P> {
    fn drop(&mut self) {
        if self.pin.set_mode(PinMode::Output).is_err() {
            log_warn!("echo line could not return to output mode");
        }
        if self.pin.set_low().is_err() {
            log_warn!("echo line could not be driven low");
        }
    }
}
