//! Decimal-string <-> integer-minor-unit conversion for the HTTP wire
//! (spec §11, grounded in the original `pkg/currency/currency.go`).
//! Fixed at a 2-decimal scale (cents); the core never sees a fraction.

use crate::error::TransferError;

pub fn parse_amount(s: &str) -> Result<i64, TransferError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(TransferError::InvalidAmount);
    }

    let negative = s.starts_with('-');
    let unsigned = s.strip_prefix('-').or_else(|| s.strip_prefix('+')).unwrap_or(s);

    let mut parts = unsigned.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let frac = parts.next().unwrap_or("");

    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TransferError::InvalidAmount);
    }
    if frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TransferError::InvalidAmount);
    }

    let whole_val: i64 = whole.parse().map_err(|_| TransferError::InvalidAmount)?;
    let frac_val: i64 = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<2}").parse().map_err(|_| TransferError::InvalidAmount)?
    };

    let total = whole_val
        .checked_mul(100)
        .and_then(|w| w.checked_add(frac_val))
        .ok_or(TransferError::InvalidAmount)?;

    Ok(if negative { -total } else { total })
}

pub fn format_amount(minor_units: i64) -> String {
    let negative = minor_units < 0;
    let abs = minor_units.unsigned_abs();
    let whole = abs / 100;
    let frac = abs % 100;
    format!("{}{whole}.{frac:02}", if negative { "-" } else { "" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_and_fractional_amounts() {
        assert_eq!(parse_amount("100.50").unwrap(), 10050);
        assert_eq!(parse_amount("0.01").unwrap(), 1);
        assert_eq!(parse_amount("5").unwrap(), 500);
    }

    #[test]
    fn parses_negative_amounts() {
        assert_eq!(parse_amount("-10.00").unwrap(), -1000);
    }

    #[test]
    fn pads_single_fractional_digit() {
        assert_eq!(parse_amount("1.5").unwrap(), 150);
    }

    #[test]
    fn rejects_too_many_fractional_digits() {
        assert!(parse_amount("1.005").is_err());
    }

    #[test]
    fn rejects_non_numeric_input() {
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("").is_err());
        assert!(parse_amount("1.2.3").is_err());
    }

    #[test]
    fn format_roundtrips_parse() {
        for s in ["100.50", "0.01", "5.00", "-10.00"] {
            let minor = parse_amount(s).unwrap();
            assert_eq!(format_amount(minor), s);
        }
    }
}
