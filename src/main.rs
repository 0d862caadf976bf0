#![no_std]
#![no_main]

use bsp::entry;
use bme680::{Bme680, I2CAddress, IIRFilterSize, OversamplingSetting, PowerMode, SettingsBuilder};
use core::convert::Infallible;
use core::time::Duration;
use defmt::*;
use defmt_rtt as _;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use hd44780_driver::bus::FourBitBus;
use hd44780_driver::HD44780;
use panic_probe as _;

// Provide an alias for our BSP so we can switch targets quickly.
// Uncomment the BSP you included in Cargo.toml, the rest of the code does not need to change.
use rp_pico as bsp;

use bsp::hal::{
    clocks::{init_clocks_and_plls, Clock as _},
    pac,
    watchdog::Watchdog,
};
use proximity_rs::monitor::{Monitor, Peripherals};
use proximity_rs::pin::{FlexPin, PinMode};
use proximity_rs::rendering::CharacterDisplay;
use proximity_rs::sensors::Bme680Climate;
use proximity_rs::telemetry::LineProtocolSink;
use proximity_rs::timer::{Clock, Instant};
use proximity_rs::MonitorConfig;
use rp_pico::hal;
use rp_pico::hal::fugit::RateExtU32;
use rp_pico::hal::gpio::bank0::{Gpio0, Gpio1, Gpio2, Gpio3, Gpio4, Gpio5, Gpio7};
use rp_pico::hal::gpio::{
    FunctionI2C, FunctionSio, FunctionUart, OutputEnableOverride, Pin, PullDown, PullUp, SioOutput,
};
use rp_pico::hal::uart::{DataBits, StopBits, UartConfig, UartPeripheral};
use rp_pico::hal::Timer;

// Pin map
// LCD: RS=GPIO0 EN=GPIO1 D4..D7=GPIO2..GPIO5
// Buzzer: GPIO6
// Ultrasonic trigger/echo: GPIO7
// BME680: SDA=GPIO8 SCL=GPIO9
// Button: GPIO10 (active-low)
// Line protocol out: UART0 TX=GPIO16 RX=GPIO17

const UART_BAUD: u32 = 115_200;

type LcdPin<I> = Pin<I, FunctionSio<SioOutput>, PullDown>;
type Lcd = HD44780<
    FourBitBus<LcdPin<Gpio0>, LcdPin<Gpio1>, LcdPin<Gpio2>, LcdPin<Gpio3>, LcdPin<Gpio4>, LcdPin<Gpio5>>,
>;

#[entry]
fn main() -> ! {
    info!("ProximityPi Starting");
    // Grab our singleton objects
    let mut pac = pac::Peripherals::take().unwrap();
    let _core = pac::CorePeripherals::take().unwrap();

    // Set up the watchdog driver - needed by the clock setup code
    let mut watchdog = Watchdog::new(pac.WATCHDOG);

    // Configure the clocks
    //
    // The default is to generate a 125 MHz system clock
    let clocks = init_clocks_and_plls(
        rp_pico::XOSC_CRYSTAL_FREQ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();

    // The single-cycle I/O block controls our GPIO pins
    let sio = hal::Sio::new(pac.SIO);

    // Set the pins up according to their function on this particular board
    let pins = rp_pico::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    let mut delay = Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);

    // Set up BME680
    let sda: Pin<_, FunctionI2C, PullUp> = pins.gpio8.reconfigure();
    let scl: Pin<_, FunctionI2C, PullUp> = pins.gpio9.reconfigure();
    let i2c = hal::I2C::i2c0(
        pac.I2C0,
        sda,
        scl,
        100.kHz(),
        &mut pac.RESETS,
        &clocks.system_clock,
    );
    let mut bme = Bme680::init(i2c, &mut delay, I2CAddress::Secondary).unwrap();
    let settings = SettingsBuilder::new()
        .with_humidity_oversampling(OversamplingSetting::OS2x)
        .with_pressure_oversampling(OversamplingSetting::OS4x)
        .with_temperature_oversampling(OversamplingSetting::OS8x)
        .with_temperature_filter(IIRFilterSize::Size3)
        .with_gas_measurement(Duration::from_millis(1500), 320, 25)
        .with_run_gas(false)
        .build();
    bme.set_sensor_settings(&mut delay, settings).unwrap();
    bme.set_sensor_mode(&mut delay, PowerMode::ForcedMode).unwrap();

    // Set up LCD1602
    let lcd = HD44780::new_4bit(
        pins.gpio0.into_push_pull_output(),
        pins.gpio1.into_push_pull_output(),
        pins.gpio2.into_push_pull_output(),
        pins.gpio3.into_push_pull_output(),
        pins.gpio4.into_push_pull_output(),
        pins.gpio5.into_push_pull_output(),
        &mut delay,
    )
    .unwrap();

    // Set up the line protocol UART
    let uart_pins = (
        pins.gpio16.into_function::<FunctionUart>(),
        pins.gpio17.into_function::<FunctionUart>(),
    );
    let uart = UartPeripheral::new(pac.UART0, uart_pins, &mut pac.RESETS)
        .enable(
            UartConfig::new(UART_BAUD.Hz(), DataBits::Eight, None, StopBits::One),
            clocks.peripheral_clock.freq(),
        )
        .unwrap();

    let hw = Peripherals {
        echo: EchoLine(pins.gpio7.into_push_pull_output()),
        button: pins.gpio10.into_pull_up_input(),
        buzzer: pins.gpio6.into_push_pull_output(),
        display: LcdDisplay { lcd, delay },
        climate: Bme680Climate::new(bme, delay),
        sink: LineProtocolSink::new(uart),
        delay,
        clock: PicoClock(delay),
    };

    let mut monitor = Monitor::new(hw, MonitorConfig::default());

    info!("ProximityPi Ready");

    // Nothing asks the board to stop; it runs until power-off or a fault
    if let Err(e) = monitor.run(|| false) {
        error!("Monitor halted: {}", e);
    }

    loop {
        cortex_m::asm::wfi();
    }
}

/// The ultrasonic module's shared trigger/echo line.
/// Input mode is the output driver disabled through the pad override,
/// so the pin keeps its SIO function and can be read at any time.
struct EchoLine(Pin<Gpio7, FunctionSio<SioOutput>, PullDown>);

impl ErrorType for EchoLine {
    type Error = Infallible;
}

impl OutputPin for EchoLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_low()
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_high()
    }
}

impl InputPin for EchoLine {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.0.as_input().is_high()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.0.as_input().is_low()
    }
}

impl FlexPin for EchoLine {
    fn set_mode(&mut self, mode: PinMode) -> Result<(), Self::Error> {
        match mode {
            PinMode::Input => self.0.set_output_enable_override(OutputEnableOverride::Disable),
            PinMode::Output => self.0.set_output_enable_override(OutputEnableOverride::DontInvert),
        }
        Ok(())
    }
}

/// The 64-bit microsecond counter of the RP2040 timer
struct PicoClock(Timer);

impl Clock for PicoClock {
    fn now(&self) -> Instant {
        Instant::from_ticks(self.0.get_counter().ticks())
    }
}

/// HD44780 on a 4-bit bus
struct LcdDisplay {
    lcd: Lcd,
    delay: Timer,
}

impl CharacterDisplay for LcdDisplay {
    type Error = hd44780_driver::error::Error;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.lcd.clear(&mut self.delay)
    }

    fn write_line(&mut self, row: u8, text: &str) -> Result<(), Self::Error> {
        // Second row starts at DDRAM address 0x40
        let position = if row == 0 { 0x00 } else { 0x40 };
        self.lcd.set_cursor_pos(position, &mut self.delay)?;
        self.lcd.write_str(text, &mut self.delay)
    }
}
