//! Piecewise-linear scoring curves and the small statistics used by the
//! health score.

/// Iterations used by [`newton_sqrt`]. Changing it changes score output.
pub const NEWTON_SQRT_ITERATIONS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub lower: f64,
    pub upper: f64,
    pub score_at_lower: f64,
    pub score_at_upper: f64,
}

impl Segment {
    pub const fn new(lower: f64, upper: f64, score_at_lower: f64, score_at_upper: f64) -> Self {
        Self {
            lower,
            upper,
            score_at_lower,
            score_at_upper,
        }
    }

    fn interpolate(&self, x: f64) -> f64 {
        let width = self.upper - self.lower;
        if width == 0.0 {
            return self.score_at_lower;
        }
        let t = (x - self.lower) / width;
        self.score_at_lower + t * (self.score_at_upper - self.score_at_lower)
    }
}

/// Ordered, contiguous segments. A segment covers `[lower, upper)`; inputs
/// below the first segment take its lower score, inputs at or above the last
/// take its upper score. Results are clamped to `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreCurve {
    segments: &'static [Segment],
}

impl ScoreCurve {
    pub const fn new(segments: &'static [Segment]) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &'static [Segment] {
        self.segments
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let (first, last) = match (self.segments.first(), self.segments.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };

        let score = if x.is_nan() || x < first.lower {
            first.score_at_lower
        } else if x >= last.upper {
            last.score_at_upper
        } else {
            self.segments
                .iter()
                .find(|s| x >= s.lower && x < s.upper)
                .map(|s| s.interpolate(x))
                .unwrap_or(last.score_at_upper)
        };

        score.clamp(0.0, 100.0)
    }
}

/// Savings rate (percent) to score.
pub const SAVINGS_CURVE: ScoreCurve = ScoreCurve::new(&[
    Segment::new(-40.0, 0.0, 0.0, 40.0),
    Segment::new(0.0, 10.0, 40.0, 60.0),
    Segment::new(10.0, 20.0, 60.0, 80.0),
    Segment::new(20.0, 30.0, 80.0, 100.0),
]);

/// Fixed obligations as percent of net income to score.
pub const DEBT_CURVE: ScoreCurve = ScoreCurve::new(&[
    Segment::new(30.0, 50.0, 100.0, 80.0),
    Segment::new(50.0, 70.0, 80.0, 60.0),
    Segment::new(70.0, 90.0, 60.0, 40.0),
    Segment::new(90.0, 130.0, 40.0, 0.0),
]);

/// Average goal progress (percent) to score. Jumps from 20 to 40 at 20%.
pub const GOAL_CURVE: ScoreCurve = ScoreCurve::new(&[
    Segment::new(0.0, 20.0, 0.0, 20.0),
    Segment::new(20.0, 40.0, 40.0, 60.0),
    Segment::new(40.0, 60.0, 60.0, 80.0),
    Segment::new(60.0, 80.0, 80.0, 100.0),
]);

/// Expense coefficient of variation (percent) to score.
pub const VOLATILITY_CURVE: ScoreCurve = ScoreCurve::new(&[
    Segment::new(10.0, 20.0, 100.0, 80.0),
    Segment::new(20.0, 30.0, 80.0, 60.0),
    Segment::new(30.0, 50.0, 60.0, 40.0),
    Segment::new(50.0, 90.0, 40.0, 0.0),
]);

/// Square root by a fixed number of Newton steps.
///
/// The first guess halves the exponent of `x`, so it starts within a small
/// factor of the root for any finite input. Non-positive input and NaN
/// return 0; infinity is returned unchanged.
pub fn newton_sqrt(x: f64) -> f64 {
    if x <= 0.0 || x.is_nan() {
        return 0.0;
    }
    if x.is_infinite() {
        return x;
    }
    let mut guess = f64::from_bits((x.to_bits() >> 1) + (1023 << 51));
    for _ in 0..NEWTON_SQRT_ITERATIONS {
        guess = 0.5 * (guess + x / guess);
    }
    guess
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let variance =
        values.iter().map(|v| (v - avg) * (v - avg)).sum::<f64>() / values.len() as f64;
    Some(newton_sqrt(variance))
}

/// `std_dev / mean`; `None` without data or with a non-positive mean.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    if avg <= 0.0 {
        return None;
    }
    Some(std_dev(values)? / avg)
}
