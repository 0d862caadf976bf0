use ufmt::{uDisplay, uWrite, Formatter};

/// A value stored in hundredths of its unit (cm, °C or %).
///
/// Displays like a short float: trailing zero of the hundredths is dropped
/// but at least one decimal stays, so `3430` prints `34.3` and `1000`
/// prints `10.0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Hundredths(pub i32);

impl Hundredths {
    pub const ZERO: Hundredths = Hundredths(0);

    /// Creates a value with no fractional part
    pub const fn from_whole(value: i32) -> Self {
        Hundredths(value * 100)
    }

    /// Converts a float, rounding half away from zero
    pub fn from_f32(value: f32) -> Self {
        let scaled = value * 100.0;
        if scaled >= 0.0 {
            Hundredths((scaled + 0.5) as i32)
        } else {
            Hundredths((scaled - 0.5) as i32)
        }
    }

    /// Rounds to a single decimal, half away from zero
    /// returns the value in tenths
    pub const fn tenths(self) -> i32 {
        div_round(self.0 as i64, 10) as i32
    }

    /// Formats the value with exactly one decimal
    /// param w: ufmt writer
    pub fn write_one_decimal<W: uWrite + ?Sized>(self, w: &mut W) -> Result<(), W::Error> {
        let tenths = self.tenths();
        if tenths < 0 {
            w.write_str("-")?;
        }
        let abs = tenths.unsigned_abs();
        write_u32(w, abs / 10)?;
        w.write_str(".")?;
        write_u32(w, abs % 10)
    }
}

/// Divides rounding half away from zero
/// param n: numerator
/// param d: positive denominator
pub const fn div_round(n: i64, d: i64) -> i64 {
    if n >= 0 {
        (n + d / 2) / d
    } else {
        (n - d / 2) / d
    }
}

fn write_u32<W: uWrite + ?Sized>(w: &mut W, value: u32) -> Result<(), W::Error> {
    let mut digits = [0u8; 10];
    let mut n = value;
    let mut len = 0;
    loop {
        digits[len] = b'0' + (n % 10) as u8;
        len += 1;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    for digit in digits[..len].iter().rev() {
        w.write_char(*digit as char)?;
    }
    Ok(())
}

impl uDisplay for Hundredths {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        if self.0 < 0 {
            f.write_str("-")?;
        }
        let abs = self.0.unsigned_abs();
        let whole = abs / 100;
        let frac = abs % 100;
        uDisplay::fmt(&whole, f)?;
        f.write_str(".")?;
        if frac % 10 == 0 {
            uDisplay::fmt(&(frac / 10), f)
        } else {
            if frac < 10 {
                f.write_str("0")?;
            }
            uDisplay::fmt(&frac, f)
        }
    }
}
