use core::fmt::Debug;

use heapless::String;
use ufmt::uwrite;

use crate::error::MonitorError;
use crate::fixed::Hundredths;

/// Characters per display row
pub const LINE_WIDTH: usize = 16;

/// One display row worth of text
pub type Line = String<LINE_WIDTH>;

pub const BANNER: &str = "System started";
pub const NO_TARGET: &str = "No target";
pub const INTRUDER: &str = "INTRUDER ALERT!";
pub const READING_CLIMATE: &str = "Reading T/H";
pub const CLIMATE_ERROR: &str = "T/H error";
pub const STOPPED: &str = "System stopped";
pub const FAULT: &str = "System error";

/// Port for a two-row character display.
pub trait CharacterDisplay {
    type Error: Debug;

    /// Blanks the screen and homes the cursor
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Writes text from the first column of a row
    /// param row: 0 for the top line, 1 for the bottom line
    /// param text: at most LINE_WIDTH characters
    fn write_line(&mut self, row: u8, text: &str) -> Result<(), Self::Error>;
}

/// Basic function for rendering text onto the display.
/// It only clears the screen when the top line is written to
/// param line: text to render
/// param top_line: if the top line is to be written to
/// param display: display instance
pub fn render_screen<L: CharacterDisplay + ?Sized>(
    line: &str,
    top_line: bool,
    display: &mut L,
) -> Result<(), MonitorError> {
    if top_line {
        display.clear().map_err(|_| MonitorError::Display)?;
        display.write_line(0, line).map_err(|_| MonitorError::Display)
    } else {
        display.write_line(1, line).map_err(|_| MonitorError::Display)
    }
}

/// Renders the distance on the top line, with the intruder warning underneath when alarmed
/// param distance: detected distance in cm
/// param alarm: whether the alarm is sounding
pub fn render_distance<L: CharacterDisplay + ?Sized>(
    distance: Hundredths,
    alarm: bool,
    display: &mut L,
) -> Result<(), MonitorError> {
    render_screen(&format_distance(distance)?, true, display)?;
    if alarm {
        render_screen(INTRUDER, false, display)?;
    }
    Ok(())
}

/// Renders temperature on the top line and humidity on the bottom
pub fn render_climate<L: CharacterDisplay + ?Sized>(
    temperature: Hundredths,
    humidity: Hundredths,
    display: &mut L,
) -> Result<(), MonitorError> {
    let (top, bottom) = format_climate(temperature, humidity)?;
    render_screen(&top, true, display)?;
    render_screen(&bottom, false, display)
}

/// `Dist: 34.3cm`
pub fn format_distance(distance: Hundredths) -> Result<Line, MonitorError> {
    let mut line = Line::new();
    uwrite!(line, "Dist: {}cm", distance).map_err(|_| MonitorError::Format)?;
    Ok(line)
}

/// `Temp:23.4C` and `Hum:45.0%`
pub fn format_climate(temperature: Hundredths, humidity: Hundredths) -> Result<(Line, Line), MonitorError> {
    let mut top = Line::new();
    let mut bottom = Line::new();
    top.push_str("Temp:").map_err(|_| MonitorError::Format)?;
    temperature
        .write_one_decimal(&mut top)
        .map_err(|_| MonitorError::Format)?;
    top.push('C').map_err(|_| MonitorError::Format)?;
    bottom.push_str("Hum:").map_err(|_| MonitorError::Format)?;
    humidity
        .write_one_decimal(&mut bottom)
        .map_err(|_| MonitorError::Format)?;
    bottom.push('%').map_err(|_| MonitorError::Format)?;
    Ok((top, bottom))
}
