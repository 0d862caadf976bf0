//! Time-series points and their InfluxDB line-protocol encoding
//!
//! Every point goes to the `sensores` measurement, tagged with the sensor it
//! came from:
//!
//! ```text
//! sensores,sensor=ultrasonico distance_cm=34.3
//! sensores,sensor=dht11 temperature=23.4,humidity=45.0
//! ```

use core::fmt::{self, Debug, Write};

use heapless::{String, Vec};
use ufmt::uwrite;

use crate::fixed::Hundredths;

pub const MEASUREMENT: &str = "sensores";
pub const ULTRASONIC_TAG: &str = "ultrasonico";
/// Kept from the first deployment so existing dashboards keep matching
pub const CLIMATE_TAG: &str = "dht11";

pub const DISTANCE_FIELD: &str = "distance_cm";
pub const TEMPERATURE_FIELD: &str = "temperature";
pub const HUMIDITY_FIELD: &str = "humidity";

pub const MAX_FIELDS: usize = 2;
pub const LINE_CAPACITY: usize = 96;

/// One line of the time series.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Point {
    pub measurement: &'static str,
    pub sensor: &'static str,
    pub fields: Vec<(&'static str, Hundredths), MAX_FIELDS>,
}

impl Point {
    fn new(sensor: &'static str, fields: &[(&'static str, Hundredths)]) -> Self {
        Self {
            measurement: MEASUREMENT,
            sensor,
            fields: fields.iter().take(MAX_FIELDS).copied().collect(),
        }
    }

    /// A distance point from the ultrasonic sensor
    pub fn distance(distance: Hundredths) -> Self {
        Self::new(ULTRASONIC_TAG, &[(DISTANCE_FIELD, distance)])
    }

    /// A temperature/humidity point from the climate sensor
    pub fn climate(temperature: Hundredths, humidity: Hundredths) -> Self {
        Self::new(
            CLIMATE_TAG,
            &[(TEMPERATURE_FIELD, temperature), (HUMIDITY_FIELD, humidity)],
        )
    }

    pub fn field(&self, name: &str) -> Option<Hundredths> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| *value)
    }

    /// Encodes the point as one line-protocol line, without the newline
    /// returns Err if the line does not fit LINE_CAPACITY
    pub fn encode(&self) -> Result<String<LINE_CAPACITY>, fmt::Error> {
        let mut line: String<LINE_CAPACITY> = String::new();
        uwrite!(line, "{},sensor={}", self.measurement, self.sensor).map_err(|_| fmt::Error)?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            let separator = if i == 0 { " " } else { "," };
            uwrite!(line, "{}{}={}", separator, *name, *value).map_err(|_| fmt::Error)?;
        }
        Ok(line)
    }
}

/// Port for the time-series store.
pub trait TimeSeriesSink {
    type Error: Debug;

    fn write_point(&mut self, point: &Point) -> Result<(), Self::Error>;
}

/// Writes line protocol to any text writer, one point per line.
///
/// On the board the writer is a UART and a host-side forwarder relays the
/// lines into the database.
pub struct LineProtocolSink<W: Write> {
    writer: W,
}

impl<W: Write> LineProtocolSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }
}

impl<W: Write> TimeSeriesSink for LineProtocolSink<W> {
    type Error = fmt::Error;

    fn write_point(&mut self, point: &Point) -> Result<(), Self::Error> {
        let line = point.encode()?;
        self.writer.write_str(&line)?;
        self.writer.write_char('\n')
    }
}
