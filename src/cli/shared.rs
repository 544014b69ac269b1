use num_format::{Locale, ToFormattedString};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

pub fn format_currency(amount: Decimal) -> String {
    let whole = amount.trunc().to_i64().unwrap_or_default();
    let cents = (amount.fract().abs() * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .unwrap_or_default();
    format!("€ {},{:02}", whole.to_formatted_string(&Locale::de), cents)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn formats_amounts_with_thousands_separator() {
        assert_eq!(format_currency(dec!(1234.56)), "€ 1.234,56");
        assert_eq!(format_currency(dec!(0.4)), "€ 0,40");
        assert_eq!(format_currency(dec!(920)), "€ 920,00");
    }
}
