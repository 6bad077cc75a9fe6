/// Render an amount in minor units as a decimal string, e.g. `1999` -> `"19.99"`.
pub fn format_cents(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(1999), "19.99");
        assert_eq!(format_cents(120000), "1200.00");
        assert_eq!(format_cents(-250), "-2.50");
    }
}
