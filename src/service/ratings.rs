use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;

use crate::{models::directorymodel::SkillType, utils::decimal::average_2dp};

/// One non-null rating on a farmer's requirement, tagged with the skill kind.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct RatingSample {
    pub farmer_id: i64,
    pub skill_type: SkillType,
    pub farmer_rating: BigDecimal,
}

/// Per farmer and skill kind rating averages.
#[derive(Debug, Default, Clone)]
pub struct FarmerRatings {
    averages: HashMap<(i64, SkillType), BigDecimal>,
}

impl FarmerRatings {
    pub fn from_samples(samples: &[RatingSample]) -> Self {
        let mut grouped: HashMap<(i64, SkillType), Vec<&BigDecimal>> = HashMap::new();
        for sample in samples {
            grouped
                .entry((sample.farmer_id, sample.skill_type))
                .or_default()
                .push(&sample.farmer_rating);
        }

        let averages = grouped
            .into_iter()
            .filter_map(|(key, ratings)| average_2dp(ratings).map(|avg| (key, avg)))
            .collect();

        FarmerRatings { averages }
    }

    pub fn average(&self, farmer_id: i64, skill_type: Option<SkillType>) -> Option<BigDecimal> {
        let skill_type = skill_type?;
        self.averages.get(&(farmer_id, skill_type)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample(farmer_id: i64, skill_type: SkillType, rating: &str) -> RatingSample {
        RatingSample {
            farmer_id,
            skill_type,
            farmer_rating: BigDecimal::from_str(rating).unwrap(),
        }
    }

    #[test]
    fn averages_are_split_by_skill_kind() {
        let ratings = FarmerRatings::from_samples(&[
            sample(1, SkillType::Labor, "4.0"),
            sample(1, SkillType::Labor, "4.2"),
            sample(1, SkillType::Tractor, "3.0"),
        ]);

        assert_eq!(ratings.average(1, Some(SkillType::Labor)).unwrap().to_string(), "4.10");
        assert_eq!(ratings.average(1, Some(SkillType::Tractor)).unwrap().to_string(), "3.00");
    }

    #[test]
    fn averages_are_split_by_farmer() {
        let ratings = FarmerRatings::from_samples(&[
            sample(1, SkillType::Labor, "5.0"),
            sample(2, SkillType::Labor, "1.0"),
        ]);
        assert_eq!(ratings.average(1, Some(SkillType::Labor)).unwrap().to_string(), "5.00");
        assert_eq!(ratings.average(2, Some(SkillType::Labor)).unwrap().to_string(), "1.00");
    }

    #[test]
    fn missing_ratings_or_skill_yield_none() {
        let ratings = FarmerRatings::from_samples(&[sample(1, SkillType::Labor, "4.0")]);
        assert!(ratings.average(1, Some(SkillType::Tractor)).is_none());
        assert!(ratings.average(3, Some(SkillType::Labor)).is_none());
        assert!(ratings.average(1, None).is_none());
    }
}
