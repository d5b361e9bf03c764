use bigdecimal::{BigDecimal, RoundingMode};
use num_traits::Zero;

pub trait BigDecimalHelpers {
    fn round_2dp(&self) -> BigDecimal;
}

impl BigDecimalHelpers for BigDecimal {
    fn round_2dp(&self) -> BigDecimal {
        self.with_scale_round(2, RoundingMode::HalfEven)
    }
}

/// Mean of `values` rounded to two places, `None` when empty.
pub fn average_2dp<'a, I>(values: I) -> Option<BigDecimal>
where
    I: IntoIterator<Item = &'a BigDecimal>,
{
    let (sum, count) = values
        .into_iter()
        .fold((BigDecimal::zero(), 0u64), |(sum, count), value| (sum + value, count + 1));

    if count == 0 {
        return None;
    }

    Some((sum / BigDecimal::from(count)).round_2dp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    #[test]
    fn average_of_two_ratings() {
        let ratings = vec![dec("4.00"), dec("4.20")];
        assert_eq!(average_2dp(&ratings).unwrap().to_string(), "4.10");
    }

    #[test]
    fn single_rating_keeps_two_places() {
        let ratings = vec![dec("3.00")];
        assert_eq!(average_2dp(&ratings).unwrap().to_string(), "3.00");
    }

    #[test]
    fn repeating_average_is_rounded() {
        let ratings = vec![dec("4.00"), dec("4.00"), dec("5.00")];
        assert_eq!(average_2dp(&ratings).unwrap().to_string(), "4.33");
    }

    #[test]
    fn empty_has_no_average() {
        let ratings: Vec<BigDecimal> = Vec::new();
        assert!(average_2dp(&ratings).is_none());
    }

    #[test]
    fn round_2dp_is_half_even() {
        assert_eq!(dec("4.125").round_2dp().to_string(), "4.12");
        assert_eq!(dec("4.135").round_2dp().to_string(), "4.14");
    }
}
