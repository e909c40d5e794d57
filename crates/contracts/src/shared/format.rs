/// Formats a monetary amount for display: whole amounts drop the
/// decimals, everything else keeps two.
///
/// # Examples
/// ```
/// use contracts::shared::format::format_amount;
/// assert_eq!(format_amount(130.0), "130");
/// assert_eq!(format_amount(12.5), "12.50");
/// assert_eq!(format_amount(0.0), "0");
/// ```
pub fn format_amount(amount: f64) -> String {
    if (amount - amount.round()).abs() < 1e-9 {
        format!("{}", amount.round() as i64)
    } else {
        format!("{:.2}", amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(42.0), "42");
        assert_eq!(format_amount(160.0), "160");
        assert_eq!(format_amount(12.5), "12.50");
        assert_eq!(format_amount(9.99), "9.99");
    }
}
