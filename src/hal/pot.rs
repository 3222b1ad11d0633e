//! Potentiometer range helpers.

/// Highest raw reading of the 10-bit potentiometer ADC.
pub const POT_MAX: u16 = 1023;

/// Linearly rescale `value` from `in_min..=in_max` onto `out_min..=out_max`.
///
/// Integer arithmetic truncating toward zero. Inputs outside the range are not clamped.
pub fn map_range(value: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    if in_max == in_min {
        return out_min;
    }
    let scaled = i64::from(value - in_min) * i64::from(out_max - out_min)
        / i64::from(in_max - in_min);
    (scaled + i64::from(out_min)) as i32
}
