use float_cmp::ApproxEqRatio as _;

/// Maximum ratio by which the smaller of two mapping parameters may deviate from the larger one and still be considered
/// equal.
///
/// Mapping parameters travel over the wire as doubles that were themselves derived from a relative accuracy, so two
/// encoders configured identically can disagree in the last few bits.
const PARAMETER_RATIO_ERROR: f64 = 0.00000001;

/// Compares two mapping parameters (gamma, index offset) for approximate equality.
///
/// Two NaN values are considered equal, and two zeroes are considered equal regardless of sign.
pub(crate) fn float_eq(l_value: f64, r_value: f64) -> bool {
    if l_value == r_value {
        return true;
    }

    (l_value.is_nan() && r_value.is_nan()) || l_value.approx_eq_ratio(&r_value, PARAMETER_RATIO_ERROR)
}
