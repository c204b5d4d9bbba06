/// Format an amount as whole currency units with thousands grouping: `€25,000`
pub fn format_currency(amount: f64, symbol: &str) -> String {
    if !amount.is_finite() {
        return format!("{}0", symbol);
    }

    // f64::round rounds half away from zero, same as the browser formatter
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());

    format!("{}{}{}", sign, symbol, group_thousands(&digits))
}

/// Format a plain number without currency or grouping, dropping a trailing `.0`
pub fn format_plain(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        let s = format!("{:.2}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let len = digits.len();

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency_groups_thousands() {
        assert_eq!(format_currency(25_000.0, "€"), "€25,000");
        assert_eq!(format_currency(1_234_567.0, "€"), "€1,234,567");
        assert_eq!(format_currency(999.0, "€"), "€999");
        assert_eq!(format_currency(0.0, "€"), "€0");
    }

    #[test]
    fn test_format_currency_rounds_to_whole_units() {
        assert_eq!(format_currency(1_287.55, "€"), "€1,288");
        assert_eq!(format_currency(0.5, "€"), "€1");
        assert_eq!(format_currency(-1_234.4, "€"), "-€1,234");
    }

    #[test]
    fn test_format_currency_non_finite() {
        assert_eq!(format_currency(f64::NAN, "$"), "$0");
    }

    #[test]
    fn test_format_plain() {
        assert_eq!(format_plain(25_000.0), "25000");
        assert_eq!(format_plain(12.5), "12.5");
        assert_eq!(format_plain(0.25), "0.25");
    }
}
