use crate::fixed::Hundredths;

/// MonitorConfig holds every timing and threshold used by the monitor loop.
/// quiescence_ms: How long the echo line is held low before a trigger
/// trigger_pulse_us: Width of the trigger pulse
/// echo_timeout_us: Longest wait for each echo edge
/// cycle_rest_ms: Pause at the end of each ranging cycle
/// climate_hold_ms: How long a climate result stays on screen before ranging resumes
/// button_poll_ms: Poll interval while waiting for the button to be released
/// alarm_threshold: Distance at or under which the alarm sounds
/// max_range: Exclusive upper bound of a valid distance
/// climate_attempts: How many times the climate sensor is read before giving up
/// climate_retry_ms: Pause between climate read attempts
/// banner_ms: How long the startup banner is shown
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MonitorConfig {
    pub quiescence_ms: u32,
    pub trigger_pulse_us: u32,
    pub echo_timeout_us: u32,
    pub cycle_rest_ms: u32,
    pub climate_hold_ms: u32,
    pub button_poll_ms: u32,
    pub alarm_threshold: Hundredths,
    pub max_range: Hundredths,
    pub climate_attempts: u8,
    pub climate_retry_ms: u32,
    pub banner_ms: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            quiescence_ms: 500,
            trigger_pulse_us: 10,
            echo_timeout_us: 20_000,
            cycle_rest_ms: 1000,
            climate_hold_ms: 2000,
            button_poll_ms: 10,
            alarm_threshold: Hundredths::from_whole(10), // 10cm
            max_range: Hundredths::from_whole(500),      // 500cm
            climate_attempts: 15,
            climate_retry_ms: 2000,
            banner_ms: 1000,
        }
    }
}
