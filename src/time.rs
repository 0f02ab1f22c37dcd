//! Exact rational time rescaling.
//!
//! Every stream in a container counts time in its own [`TimeBase`] (the
//! duration of one tick, e.g. `1/15360` s for a typical H.264 track or
//! `1/44100` s for audio). Callers of this crate speak microseconds. The
//! helpers here convert between the two with integer arithmetic only, so
//! repeated seeks never accumulate floating-point drift.
//!
//! Rounding matches FFmpeg's `av_rescale_q`: to the nearest tick, with exact
//! halves rounded away from zero.
//!
//! # Example
//!
//! ```
//! use streamdemux::time::{TimeBase, rescale};
//!
//! let stream = TimeBase::new(1, 15_360);
//! assert_eq!(rescale(2_500_000, TimeBase::MICROSECONDS, stream), Some(38_400));
//! assert_eq!(rescale(38_400, stream, TimeBase::MICROSECONDS), Some(2_500_000));
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;

use ffmpeg_next::Rational;

/// A rational tick length: one unit equals `numerator / denominator` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeBase {
    /// Numerator of the tick length.
    pub numerator: i32,
    /// Denominator of the tick length.
    pub denominator: i32,
}

impl TimeBase {
    /// One microsecond per tick. The external unit of every public timestamp.
    pub const MICROSECONDS: TimeBase = TimeBase::new(1, 1_000_000);

    /// Create a time base of `numerator / denominator` seconds per tick.
    pub const fn new(numerator: i32, denominator: i32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// A time base is usable for rescaling only when neither term is zero.
    pub fn is_valid(&self) -> bool {
        self.numerator != 0 && self.denominator != 0
    }
}

impl Display for TimeBase {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl From<Rational> for TimeBase {
    fn from(rational: Rational) -> Self {
        Self::new(rational.numerator(), rational.denominator())
    }
}

impl From<TimeBase> for Rational {
    fn from(time_base: TimeBase) -> Self {
        Rational::new(time_base.numerator, time_base.denominator)
    }
}

/// Rescale `value` ticks of `from` into ticks of `to`.
///
/// Computes `value * from / to` in 128-bit integers and rounds to the
/// nearest integer, halves away from zero. Returns `None` when either time
/// base is invalid or the result does not fit in an `i64`.
pub fn rescale(value: i64, from: TimeBase, to: TimeBase) -> Option<i64> {
    if !from.is_valid() || !to.is_valid() {
        return None;
    }

    let mut numerator = value as i128 * from.numerator as i128 * to.denominator as i128;
    let mut denominator = from.denominator as i128 * to.numerator as i128;
    if denominator < 0 {
        numerator = -numerator;
        denominator = -denominator;
    }

    let half = denominator / 2;
    let quotient = if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        -((-numerator + half) / denominator)
    };

    i64::try_from(quotient).ok()
}

/// Rescale a stream-local value to microseconds.
pub fn to_micros(value: i64, time_base: TimeBase) -> Option<i64> {
    rescale(value, time_base, TimeBase::MICROSECONDS)
}

/// Rescale a microsecond value into a stream's time base.
pub fn from_micros(value_us: i64, time_base: TimeBase) -> Option<i64> {
    rescale(value_us, TimeBase::MICROSECONDS, time_base)
}

/// Convert microseconds to a [`Duration`], clamping negatives to zero.
pub fn micros_to_duration(value_us: i64) -> Duration {
    Duration::from_micros(value_us.max(0) as u64)
}

/// Convert a [`Duration`] to microseconds, saturating at `i64::MAX`.
pub fn duration_to_micros(duration: Duration) -> i64 {
    i64::try_from(duration.as_micros()).unwrap_or(i64::MAX)
}
