use std::iter::Sum;

use num::Float;
use serde::{Deserialize, Serialize};

use crate::math::interp_one;

/// And operator method for combining the compositions of propositions
/// in a fuzzy rule premise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AndOp {
    #[default]
    Min,
    Prod,
    BoundedProd,
    DrasticProd,
}

impl AndOp {
    pub fn call<F: Float>(self, u: F, v: F) -> F {
        match self {
            Self::Min => F::min(u, v),
            Self::Prod => u * v,
            Self::BoundedProd => F::max(F::zero(), u + v - F::one()),
            Self::DrasticProd => {
                if v == F::one() {
                    u
                } else if u == F::one() {
                    v
                } else {
                    F::zero()
                }
            },
        }
    }

    /// Folds all degrees; an empty premise is fully satisfied.
    pub fn fold<F: Float>(self, degrees: impl IntoIterator<Item = F>) -> F {
        degrees.into_iter().fold(F::one(), |acc, d| self.call(acc, d))
    }
}

/// Or operator method for combining the compositions of propositions
/// in a fuzzy rule premise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrOp {
    #[default]
    Max,
    ProbOr,
    BoundedSum,
    DrasticSum,
}

impl OrOp {
    pub fn call<F: Float>(self, u: F, v: F) -> F {
        match self {
            Self::Max => F::max(u, v),
            Self::ProbOr => u + v - u * v,
            Self::BoundedSum => F::min(F::one(), u + v),
            Self::DrasticSum => {
                if v == F::zero() {
                    u
                } else if u == F::zero() {
                    v
                } else {
                    F::one()
                }
            },
        }
    }

    pub fn fold<F: Float>(self, degrees: impl IntoIterator<Item = F>) -> F {
        degrees.into_iter().fold(F::zero(), |acc, d| self.call(acc, d))
    }
}

/// Implication operator shaping a consequent term by the rule's firing strength.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImplicationOp {
    /// Clip the consequent at the firing strength (Mamdani)
    #[default]
    Min,
    /// Scale the consequent by the firing strength (Larsen)
    Prod,
}

impl ImplicationOp {
    pub fn call<F: Float>(self, strength: F, membership: F) -> F {
        match self {
            Self::Min => F::min(strength, membership),
            Self::Prod => strength * membership,
        }
    }
}

/// Method for aggregating the consequences of the fuzzy rules.
///
/// Every variant is commutative and associative, so rule order never
/// changes the aggregate (up to float rounding for the sums).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationOp {
    #[default]
    Max,
    ProbOr,
    BoundedSum,
    /// Unbounded sum; the centroid stays well defined
    Sum,
}

impl AggregationOp {
    pub fn call<F: Float>(self, u: F, v: F) -> F {
        match self {
            Self::Max => F::max(u, v),
            Self::ProbOr => u + v - u * v,
            Self::BoundedSum => F::min(F::one(), u + v),
            Self::Sum => u + v,
        }
    }

    /// Pointwise `acc[i] = op(acc[i], v[i])`.
    pub fn accumulate<F: Float>(self, acc: &mut [F], v: impl IntoIterator<Item = F>) {
        for (a, v) in acc.iter_mut().zip(v) {
            *a = self.call(*a, v);
        }
    }
}

/// Method for defuzzifcating the resulting membership function.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefuzzificationOp {
    /// Center of Gravity
    #[default]
    Centroid,
    /// Bisector of Area
    Bisector,
    /// Mean of the values for which the membership function is maximum
    MeanOfMaxima,
    /// Largest value for which the membership function is maximum
    LargestOfMaxima,
    /// Smallest value for which the membership function is maximum
    SmallestOfMaxima,
}

impl DefuzzificationOp {
    /// Reduces a sampled profile to a crisp value.
    ///
    /// The profile is taken as piecewise linear between samples. Returns
    /// `None` when the profile has no area (nothing fired) or the grid has
    /// fewer than two points.
    pub fn call<F: Float + Sum>(self, universe: &[F], membership: &[F]) -> Option<F> {
        debug_assert_eq!(universe.len(), membership.len());

        if universe.len() < 2 || !membership.iter().any(|m| *m > F::zero()) {
            return None;
        }

        let two = F::one() + F::one();

        match self {
            Self::Centroid => {
                let three = two + F::one();
                let mut area_sum = F::zero();
                let mut moment_sum = F::zero();

                for i in 0..universe.len() - 1 {
                    let base = universe[i + 1] - universe[i];
                    // Each segment is a rectangle under the lower sample plus a triangle on top
                    let area_rect = F::min(membership[i], membership[i + 1]) * base;
                    let center_rect = universe[i] + base / two;
                    let area_tri = base * F::abs(membership[i + 1] - membership[i]) / two;
                    let center_tri = if membership[i + 1] > membership[i] {
                        universe[i] + two / three * base
                    } else {
                        universe[i] + F::one() / three * base
                    };

                    area_sum = area_sum + area_rect + area_tri;
                    moment_sum = moment_sum + area_rect * center_rect + area_tri * center_tri;
                }

                if area_sum > F::zero() {
                    Some(moment_sum / area_sum)
                } else {
                    None
                }
            },
            Self::Bisector => {
                let areas: Vec<F> = universe
                    .windows(2)
                    .zip(membership.windows(2))
                    .map(|(u, m)| (m[0] + m[1]) * (u[1] - u[0]) / two)
                    .collect();
                let total_area = areas.iter().copied().sum::<F>();

                if total_area <= F::zero() {
                    return None;
                }

                let target = total_area / two;
                let mut cum_area = F::zero();

                for (i_area, area) in areas.iter().copied().enumerate() {
                    if cum_area + area >= target {
                        let xp = [(cum_area, universe[i_area]), (cum_area + area, universe[i_area + 1])];

                        return Some(interp_one(target, &xp));
                    }
                    cum_area = cum_area + area;
                }

                universe.last().copied()
            },
            Self::MeanOfMaxima | Self::LargestOfMaxima | Self::SmallestOfMaxima => {
                let maximum = membership.iter().copied().fold(F::zero(), F::max);
                let maxima = universe
                    .iter()
                    .copied()
                    .zip(membership.iter().copied())
                    .filter_map(|(u, m)| if m == maximum { Some(u) } else { None });

                match self {
                    Self::LargestOfMaxima => maxima.reduce(F::max),
                    Self::SmallestOfMaxima => maxima.reduce(F::min),
                    _ => {
                        let (len, sum) = maxima.fold((F::zero(), F::zero()), |(len, sum), u| (len + F::one(), sum + u));

                        Some(sum / len)
                    },
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linspace::Linspace;

    fn triangle(universe: &[f64], a: f64, b: f64, c: f64) -> Vec<f64> {
        universe
            .iter()
            .map(|&x| {
                if x <= a || x >= c {
                    0.
                } else if x <= b {
                    (x - a) / (b - a)
                } else {
                    (c - x) / (c - b)
                }
            })
            .collect()
    }

    #[test]
    fn test_and_or_ops() {
        assert_eq!(AndOp::Min.call(0.3, 0.7), 0.3);
        assert_eq!(AndOp::Prod.call(0.5, 0.5), 0.25);
        assert_eq!(AndOp::BoundedProd.call(0.5, 0.4), 0.);
        assert_eq!(AndOp::DrasticProd.call(1., 0.4), 0.4);
        assert_eq!(AndOp::DrasticProd.call(0.9, 0.4), 0.);
        assert_eq!(AndOp::Min.fold([0.9, 0.2, 0.5]), 0.2);
        assert_eq!(OrOp::Max.fold([0.9, 0.2, 0.5]), 0.9);
        assert_eq!(OrOp::ProbOr.call(0.5, 0.5), 0.75);
        assert_eq!(OrOp::BoundedSum.call(0.7, 0.5), 1.);
        assert_eq!(OrOp::DrasticSum.call(0., 0.4), 0.4);
    }

    #[test]
    fn test_zero_strength_contributes_nothing() {
        for imp in [ImplicationOp::Min, ImplicationOp::Prod] {
            for agg in [AggregationOp::Max, AggregationOp::ProbOr, AggregationOp::BoundedSum, AggregationOp::Sum] {
                let mut acc = vec![0.1, 0.5, 0.9];

                agg.accumulate(&mut acc, [0.3, 1., 0.2].map(|m| imp.call(0., m)));

                assert_eq!(acc, vec![0.1, 0.5, 0.9], "{imp:?} {agg:?}");
            }
        }
    }

    #[test]
    fn test_centroid_of_symmetric_triangle() {
        let universe: Vec<_> = Linspace::new(0., 10., 101).collect();
        let membership = triangle(&universe, 2., 5., 8.);

        let centroid = DefuzzificationOp::Centroid.call(&universe, &membership).unwrap();

        assert!((centroid - 5.).abs() < 1e-9, "{centroid}");
    }

    #[test]
    fn test_centroid_of_ramp() {
        // Right triangle rising from 0 to 1: centroid at 2/3
        let universe: Vec<_> = Linspace::new(0., 1., 11).collect();
        let membership = universe.clone();

        let centroid = DefuzzificationOp::Centroid.call(&universe, &membership).unwrap();

        assert!((centroid - 2. / 3.).abs() < 1e-12);
    }

    #[test]
    fn test_empty_profile() {
        let universe: Vec<_> = Linspace::new(0., 1., 11).collect();
        let membership = vec![0.; 11];

        for op in [
            DefuzzificationOp::Centroid,
            DefuzzificationOp::Bisector,
            DefuzzificationOp::MeanOfMaxima,
            DefuzzificationOp::LargestOfMaxima,
            DefuzzificationOp::SmallestOfMaxima,
        ] {
            assert_eq!(op.call(&universe, &membership), None);
        }
    }

    #[test]
    fn test_bisector_and_maxima() {
        let universe: Vec<_> = Linspace::new(0., 10., 101).collect();
        let membership = triangle(&universe, 2., 5., 8.);
        let coarse: Vec<_> = Linspace::new(0., 10., 11).collect();
        let plateau: Vec<f64> = coarse.iter().map(|&x| if (3. ..=6.).contains(&x) { 1. } else { 0.5 }).collect();

        let bisector = DefuzzificationOp::Bisector.call(&universe, &membership).unwrap();

        assert!((bisector - 5.).abs() < 1e-9, "{bisector}");
        assert_eq!(DefuzzificationOp::MeanOfMaxima.call(&universe, &membership), Some(5.));
        assert_eq!(DefuzzificationOp::SmallestOfMaxima.call(&coarse, &plateau), Some(3.));
        assert_eq!(DefuzzificationOp::LargestOfMaxima.call(&coarse, &plateau), Some(6.));
        assert_eq!(DefuzzificationOp::MeanOfMaxima.call(&coarse, &plateau), Some(4.5));
    }
}
