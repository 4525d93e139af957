//! Pure aggregation and rounding helpers used by line bodies.
//!
//! Nothing here touches form state. Rounding to whole currency units happens
//! only in `round_half_up`, which the field serializer and summary call at
//! the output step. `sum_defined` adds amounts that exist only when their
//! source form is attached.

use crate::config::Bracket;

/// Sums amounts, treating undefined entries as zero.
pub fn sum_defined(values: &[Option<f64>]) -> f64 {
    values.iter().map(|v| v.unwrap_or(0.0)).sum()
}

pub fn sum(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().sum()
}

/// Floors a value at zero for lines that cannot be negative.
#[inline(always)]
pub fn clamp_floor_zero(value: f64) -> f64 {
    if value > 0.0 { value } else { 0.0 }
}

/// Round half up to whole currency units.
///
/// The fractional part is compared against one half directly, so values
/// just below a half stay down.
pub fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 { floor + 1.0 } else { floor }
}

/// `numerator / denominator`, or zero when the denominator is zero.
pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 { 0.0 } else { numerator / denominator }
}

/// Reduces `amount` linearly as `income` moves through
/// `[threshold, threshold + range]`. A non-positive range removes the whole
/// amount once income passes the threshold.
pub fn phase_out(amount: f64, income: f64, threshold: f64, range: f64) -> f64 {
    let excess = clamp_floor_zero(income - threshold);
    if excess == 0.0 {
        return amount;
    }
    if range <= 0.0 {
        return 0.0;
    }
    let fraction = (excess / range).min(1.0);
    clamp_floor_zero(amount * (1.0 - fraction))
}

/// Rounds `value` up to the next multiple of `step`.
pub fn ceil_to_step(value: f64, step: f64) -> f64 {
    if step <= 0.0 { value } else { (value / step).ceil() * step }
}

/// Progressive tax over ascending bracket floors.
pub fn bracket_tax(income: f64, brackets: &[Bracket]) -> f64 {
    let income = clamp_floor_zero(income);
    let mut tax = 0.0;
    for (i, b) in brackets.iter().enumerate() {
        if income <= b.floor {
            break;
        }
        let ceiling = brackets.get(i + 1).map(|n| n.floor).unwrap_or(f64::INFINITY);
        tax += (income.min(ceiling) - b.floor) * b.rate;
    }
    tax
}

/// Tax on `taxable` income of which `preferential` is qualified dividends
/// and net capital gain, taxed at 0/15/20% with the rest on the ordinary
/// brackets. Never exceeds the all-ordinary computation.
pub fn preferential_rate_tax(
    taxable: f64,
    preferential: f64,
    brackets: &[Bracket],
    zero_rate_top: f64,
    fifteen_rate_top: f64,
) -> f64 {
    let taxable = clamp_floor_zero(taxable);
    let preferential = clamp_floor_zero(preferential).min(taxable);
    let ordinary = taxable - preferential;

    let at_zero = taxable.min(zero_rate_top) - ordinary.min(zero_rate_top.min(taxable));
    let at_zero = clamp_floor_zero(at_zero);
    let room_at_fifteen = clamp_floor_zero(taxable.min(fifteen_rate_top) - (ordinary + at_zero));
    let at_fifteen = (preferential - at_zero).min(room_at_fifteen);
    let at_twenty = clamp_floor_zero(preferential - at_zero - at_fifteen);

    let split = bracket_tax(ordinary, brackets) + at_fifteen * 0.15 + at_twenty * 0.20;
    split.min(bracket_tax(taxable, brackets))
}
