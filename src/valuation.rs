use crate::error::ValuationError;
use crate::models::ValuationInput;

/// Value of a single 4* output or impact case study in a sub-profile.
///
/// A 4* item attracts four times the funding of a 3* item, so the
/// allocation is shared across `4 * (4* items) + (3* items)` weighted units.
pub fn four_star_value(input: &ValuationInput) -> Result<f64, ValuationError> {
    check_input(input)?;
    let outputs = f64::from(input.outputs_required);
    let denominator = 4.0 * (outputs * (input.four_star_activity / 100.0))
        + outputs * (input.three_star_activity / 100.0);

    if denominator == 0.0 || !denominator.is_finite() {
        return Err(ValuationError::DivisionByZero);
    }

    let value = round_cents(4.0 * (input.mainstream_allocation / denominator));
    if !value.is_finite() {
        return Err(ValuationError::InvalidInput {
            field: "mainstream_allocation",
            reason: "value is too large".to_string(),
        });
    }
    Ok(value)
}

/// Applies the same ranges the CSV cell parsers enforce.
pub fn check_input(input: &ValuationInput) -> Result<(), ValuationError> {
    let invalid = |field: &'static str| {
        move |reason: String| ValuationError::InvalidInput { field, reason }
    };
    check_allocation(input.mainstream_allocation).map_err(invalid("mainstream_allocation"))?;
    check_percentage(input.three_star_activity).map_err(invalid("three_star_activity"))?;
    check_percentage(input.four_star_activity).map_err(invalid("four_star_activity"))?;
    Ok(())
}

/// Rounds to whole pence, ties to even.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

pub fn format_value(value: f64) -> String {
    format!("{value:.2}")
}

pub fn parse_allocation(raw: &str) -> Result<f64, String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '£')
        .collect();
    check_allocation(parse_number(&cleaned)?)
}

fn check_allocation(value: f64) -> Result<f64, String> {
    if !value.is_finite() {
        return Err("value is not finite".to_string());
    }
    if value < 0.0 {
        return Err("allocation must not be negative".to_string());
    }
    Ok(value)
}

pub fn parse_percentage(raw: &str) -> Result<f64, String> {
    let cleaned = raw.trim().trim_end_matches('%').trim();
    check_percentage(parse_number(cleaned)?)
}

fn check_percentage(value: f64) -> Result<f64, String> {
    if !(0.0..=100.0).contains(&value) {
        return Err("percentage must be between 0 and 100".to_string());
    }
    Ok(value)
}

pub fn parse_count(raw: &str) -> Result<u32, String> {
    let value = parse_number(raw.trim())?;
    if value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err("count must be a non-negative whole number".to_string());
    }
    Ok(value as u32)
}

fn parse_number(text: &str) -> Result<f64, String> {
    if text.is_empty() {
        return Err("value is empty".to_string());
    }
    let value: f64 = text.parse().map_err(|_| "not a number".to_string())?;
    if !value.is_finite() {
        return Err("value is not finite".to_string());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(allocation: f64, outputs: u32, three: f64, four: f64) -> ValuationInput {
        ValuationInput {
            mainstream_allocation: allocation,
            outputs_required: outputs,
            three_star_activity: three,
            four_star_activity: four,
        }
    }

    #[test]
    fn matches_worked_examples() {
        assert_eq!(four_star_value(&input(1_000_000.0, 100, 20.0, 80.0)), Ok(11764.71));
        assert_eq!(four_star_value(&input(500_000.0, 50, 30.0, 70.0)), Ok(12903.23));
    }

    #[test]
    fn zero_denominator_fails_cleanly() {
        assert_eq!(
            four_star_value(&input(1_000_000.0, 0, 0.0, 0.0)),
            Err(ValuationError::DivisionByZero)
        );
        assert_eq!(
            four_star_value(&input(1_000_000.0, 40, 0.0, 0.0)),
            Err(ValuationError::DivisionByZero)
        );
        assert_eq!(
            four_star_value(&input(1_000_000.0, 0, 30.0, 60.0)),
            Err(ValuationError::DivisionByZero)
        );
    }

    #[test]
    fn increases_with_allocation() {
        let low = four_star_value(&input(100_000.0, 20, 40.0, 50.0)).unwrap();
        let high = four_star_value(&input(200_000.0, 20, 40.0, 50.0)).unwrap();
        assert!(high > low);
    }

    #[test]
    fn decreases_with_each_denominator_input() {
        let base = four_star_value(&input(750_000.0, 30, 40.0, 50.0)).unwrap();
        assert!(four_star_value(&input(750_000.0, 31, 40.0, 50.0)).unwrap() < base);
        assert!(four_star_value(&input(750_000.0, 30, 45.0, 50.0)).unwrap() < base);
        assert!(four_star_value(&input(750_000.0, 30, 40.0, 55.0)).unwrap() < base);
    }

    #[test]
    fn half_pennies_round_to_even() {
        assert_eq!(four_star_value(&input(2503.125, 100, 0.0, 25.0)), Ok(100.12));
        assert_eq!(round_cents(0.125), 0.12);
        assert_eq!(round_cents(0.375), 0.38);
    }

    #[test]
    fn rejects_out_of_range_inputs() {
        let cases = [
            (input(-1.0, 10, 50.0, 50.0), "mainstream_allocation"),
            (input(f64::INFINITY, 10, 50.0, 50.0), "mainstream_allocation"),
            (input(f64::NAN, 10, 50.0, 50.0), "mainstream_allocation"),
            (input(1000.0, 10, 120.0, 50.0), "three_star_activity"),
            (input(1000.0, 10, 50.0, -5.0), "four_star_activity"),
            (input(1000.0, 10, 50.0, f64::NAN), "four_star_activity"),
        ];
        for (case, expected) in cases {
            match four_star_value(&case) {
                Err(ValuationError::InvalidInput { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected invalid {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn overflowing_result_is_an_error() {
        assert!(matches!(
            four_star_value(&input(f64::MAX, 1, 0.0, 1.0)),
            Err(ValuationError::InvalidInput { .. })
        ));
    }

    #[test]
    fn zero_allocation_is_worth_nothing() {
        assert_eq!(four_star_value(&input(0.0, 10, 50.0, 50.0)), Ok(0.0));
    }

    #[test]
    fn formats_two_decimal_places() {
        assert_eq!(format_value(11764.71), "11764.71");
        assert_eq!(format_value(5.0), "5.00");
    }

    #[test]
    fn parses_currency_and_percent_text() {
        assert_eq!(parse_allocation("£1,250,000.50"), Ok(1_250_000.5));
        assert_eq!(parse_percentage(" 42.5% "), Ok(42.5));
        assert_eq!(parse_count("100.0"), Ok(100));
    }

    #[test]
    fn rejects_out_of_range_cells() {
        assert!(parse_allocation("-5").is_err());
        assert!(parse_percentage("101").is_err());
        assert!(parse_count("12.5").is_err());
        assert!(parse_count("-1").is_err());
        assert!(parse_count("").is_err());
        assert!(parse_allocation("NaN").is_err());
    }
}
