use super::{QuizError, Result, ResultTier};

/// What a finished quiz resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub score: u32,
    pub total_points: u32,
    pub percentage: f64,
    pub tier: ResultTier,
}

/// Maps a final score onto the result table.
///
/// Tiers are scanned in order. Each tier ends at `max_points` inclusive. A tier
/// with its own `min_points` starts there inclusive. Otherwise the first tier
/// starts at 0 and later ones pick up right after the previous `max_points`, so
/// a plain table leaves no room between neighbours even for fractional
/// percentages such as 33.3 or 50.5.
pub fn resolve(score: u32, total_points: u32, tiers: &[ResultTier]) -> Result<Outcome> {
    if total_points == 0 {
        return Err(QuizError::DivisionUndefined);
    }

    let percentage = f64::from(score) * 100.0 / f64::from(total_points);

    let mut previous_max: Option<f64> = None;
    for tier in tiers {
        let upper = f64::from(tier.max_points);
        let above_lower = match (tier.min_points, previous_max) {
            (Some(min), _) => percentage >= f64::from(min),
            (None, Some(previous)) => percentage > previous,
            (None, None) => percentage >= 0.0,
        };
        if above_lower && percentage <= upper {
            return Ok(Outcome {
                score,
                total_points,
                percentage,
                tier: tier.clone(),
            });
        }
        previous_max = Some(upper);
    }

    Err(QuizError::NoTierMatched { percentage })
}
