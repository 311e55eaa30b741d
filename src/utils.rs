/// format a float in fixed 8-fraction-digit exponential notation
/// (`7.50000000e-01`), the layout every `.mesh` coordinate is written in
pub(crate) fn format_e8(value: f64) -> String {
    let raw = format!("{:.8e}", value);
    match raw.split_once('e') {
        Some((mantissa, exponent)) => {
            let exp: i32 = exponent.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        // `{:e}` always produces an exponent, this keeps the helper total
        None => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::format_e8;

    #[test]
    fn fixed_exponential_layout() {
        assert_eq!(format_e8(0.0), "0.00000000e+00");
        assert_eq!(format_e8(3.0), "3.00000000e+00");
        assert_eq!(format_e8(0.75), "7.50000000e-01");
        assert_eq!(format_e8(-1.5), "-1.50000000e+00");
        assert_eq!(format_e8(125.0), "1.25000000e+02");
    }

    #[test]
    fn reparse_is_stable() {
        for &v in &[0.1, 1.0 / 3.0, 2.5e-7, 1234.5678] {
            let first: f64 = format_e8(v).parse().unwrap();
            let second: f64 = format_e8(first).parse().unwrap();
            assert_eq!(first.to_bits(), second.to_bits());
        }
    }
}
