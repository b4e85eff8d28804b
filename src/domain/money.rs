use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};

/// Share of every line total credited to the referring ambassador, in percent.
pub const AMBASSADOR_SHARE_PERCENT: i64 = 10;

/// Fraction digits kept for currency amounts.
pub const CURRENCY_SCALE: i64 = 2;

/// Per-line division of revenue between ambassador and administrator.
///
/// `ambassador + admin == line_total` holds exactly: the ambassador share is
/// rounded half-up to [`CURRENCY_SCALE`] digits and the administrator takes
/// whatever remains, rounding remainder included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevenueSplit {
    pub line_total: BigDecimal,
    pub ambassador: BigDecimal,
    pub admin: BigDecimal,
}

impl RevenueSplit {
    pub fn for_line(price: &BigDecimal, quantity: &BigDecimal) -> Self {
        let line_total = price * quantity;
        let ambassador = (&line_total * BigDecimal::from(AMBASSADOR_SHARE_PERCENT)
            / BigDecimal::from(100))
        .with_scale_round(CURRENCY_SCALE, RoundingMode::HalfUp);
        let admin = &line_total - &ambassador;
        Self {
            line_total,
            ambassador,
            admin,
        }
    }
}

/// Decimal places accepted in a line quantity.
pub const QUANTITY_MAX_SCALE: i64 = 3;

/// Whole-number digits accepted in a line quantity. With prices capped at
/// `NUMERIC(10, 2)` every line amount stays within an `i64` of minor units.
pub const QUANTITY_MAX_INTEGER_DIGITS: i64 = 6;

/// Mantissa and exponent sizes beyond which a quantity is refused outright.
const QUANTITY_REPR_LIMIT: i64 = 32;

/// Whether `quantity` fits the accepted precision.
///
/// Trailing zeros do not count, so `2.000` is accepted. The raw exponent is
/// checked first: `1e-20000000` must be refused without any arithmetic.
pub fn quantity_in_range(quantity: &BigDecimal) -> bool {
    let (_, raw_scale) = quantity.as_bigint_and_exponent();
    if raw_scale.abs() > QUANTITY_REPR_LIMIT || quantity.digits() as i64 > QUANTITY_REPR_LIMIT {
        return false;
    }

    let normalized = quantity.normalized();
    let (_, scale) = normalized.as_bigint_and_exponent();
    let integer_digits = normalized.digits() as i64 - scale;
    scale <= QUANTITY_MAX_SCALE && integer_digits <= QUANTITY_MAX_INTEGER_DIGITS
}

/// Converts a currency amount into minor units (cents), rounding half-up.
///
/// Returns `None` when the amount does not fit an `i64`.
pub fn to_minor_units(amount: &BigDecimal) -> Option<i64> {
    (amount * BigDecimal::from(100))
        .with_scale_round(0, RoundingMode::HalfUp)
        .to_i64()
}
