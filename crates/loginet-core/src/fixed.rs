use fixed::types::{I32F32, I64F64};

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert untrusted input to Fixed64. `None` for NaN, infinities, and values
/// outside the Q32.32 range.
#[inline]
pub fn checked_f64_to_fixed64(v: f64) -> Option<Fixed64> {
    Fixed64::checked_from_num(v)
}

/// `floor(raw / divisor)` in fixed point, saturating into `u32`.
///
/// Returns `None` when `divisor` is not strictly positive.
pub fn floor_div(raw: u32, divisor: Fixed64) -> Option<u32> {
    if divisor <= Fixed64::ZERO {
        return None;
    }
    // Widen so u32 numerators never clip against Q32.32's integer range.
    let quotient = I64F64::from_num(raw).saturating_div(I64F64::from_num(divisor));
    let whole = quotient.to_num::<i64>();
    Some(whole.clamp(0, u32::MAX as i64) as u32)
}
