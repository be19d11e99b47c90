use serde::{Deserialize, Serialize};

use crate::error::{FisError, Result};
use crate::math::{interp, interp_one};

/// The degree-of-membership curve of one linguistic term.
///
/// Build through the checked constructors (`triangular`, `gaussian`, ...);
/// deserialized values are re-checked by [`MembershipFunction::validate`] when
/// a rule base is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum MembershipFunction {
    /// Ramp up on `[a, b]`, ramp down on `[b, c]`
    Triangular { a: f64, b: f64, c: f64 },
    /// Ramp up on `[a, b]`, plateau on `[b, c]`, ramp down on `[c, d]`
    Trapezoidal { a: f64, b: f64, c: f64, d: f64 },
    Gaussian { mean: f64, sigma: f64 },
    /// Gaussian flanks around a unit plateau on `[c1, c2]`
    Gauss2 { sigma1: f64, c1: f64, sigma2: f64, c2: f64 },
    /// Degree 1 exactly at `point`
    Singleton { point: f64 },
    /// The same degree everywhere, e.g. an "any" term
    Constant { degree: f64 },
    /// Smooth spline ramp 0 -> 1 over `[a, b]`
    SShape { a: f64, b: f64 },
    /// Smooth spline ramp 1 -> 0 over `[a, b]`
    ZShape { a: f64, b: f64 },
    /// `SShape(a, b) * ZShape(c, d)`
    PiShape { a: f64, b: f64, c: f64, d: f64 },
    /// Linear interpolation through `(x, degree)` points, held flat past either end
    Piecewise { points: Vec<(f64, f64)> },
}

impl MembershipFunction {
    pub fn triangular(a: f64, b: f64, c: f64) -> Result<Self> {
        Self::Triangular { a, b, c }.checked()
    }

    pub fn trapezoidal(a: f64, b: f64, c: f64, d: f64) -> Result<Self> {
        Self::Trapezoidal { a, b, c, d }.checked()
    }

    pub fn gaussian(mean: f64, sigma: f64) -> Result<Self> {
        Self::Gaussian { mean, sigma }.checked()
    }

    pub fn gauss2(sigma1: f64, c1: f64, sigma2: f64, c2: f64) -> Result<Self> {
        Self::Gauss2 {
            sigma1,
            c1,
            sigma2,
            c2,
        }
        .checked()
    }

    pub fn singleton(point: f64) -> Result<Self> {
        Self::Singleton { point }.checked()
    }

    pub fn constant(degree: f64) -> Result<Self> {
        Self::Constant { degree }.checked()
    }

    pub fn s_shape(a: f64, b: f64) -> Result<Self> {
        Self::SShape { a, b }.checked()
    }

    pub fn z_shape(a: f64, b: f64) -> Result<Self> {
        Self::ZShape { a, b }.checked()
    }

    pub fn pi_shape(a: f64, b: f64, c: f64, d: f64) -> Result<Self> {
        Self::PiShape { a, b, c, d }.checked()
    }

    pub fn piecewise(points: Vec<(f64, f64)>) -> Result<Self> {
        Self::Piecewise { points }.checked()
    }

    fn checked(self) -> Result<Self> {
        self.validate()?;

        Ok(self)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Triangular { .. } => "triangular",
            Self::Trapezoidal { .. } => "trapezoidal",
            Self::Gaussian { .. } => "gaussian",
            Self::Gauss2 { .. } => "gauss2",
            Self::Singleton { .. } => "singleton",
            Self::Constant { .. } => "constant",
            Self::SShape { .. } => "s_shape",
            Self::ZShape { .. } => "z_shape",
            Self::PiShape { .. } => "pi_shape",
            Self::Piecewise { .. } => "piecewise",
        }
    }

    /// Checks that the parameters describe a well-formed curve.
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: &str| Err(FisError::invalid(format!("{} membership function", self.name()), reason));

        match self {
            Self::Triangular { a, b, c } => {
                if !finite(&[*a, *b, *c]) {
                    return fail("control points must be finite");
                }
                if !(a <= b && b <= c) {
                    return fail("control points must satisfy a <= b <= c");
                }
            },
            Self::Trapezoidal { a, b, c, d } => {
                if !finite(&[*a, *b, *c, *d]) {
                    return fail("control points must be finite");
                }
                if !(a <= b && b <= c && c <= d) {
                    return fail("control points must satisfy a <= b <= c <= d");
                }
            },
            Self::Gaussian { mean, sigma } => {
                if !finite(&[*mean, *sigma]) {
                    return fail("parameters must be finite");
                }
                if *sigma <= 0. {
                    return fail("sigma must be positive");
                }
            },
            Self::Gauss2 {
                sigma1,
                c1,
                sigma2,
                c2,
            } => {
                if !finite(&[*sigma1, *c1, *sigma2, *c2]) {
                    return fail("parameters must be finite");
                }
                if *sigma1 <= 0. || *sigma2 <= 0. {
                    return fail("sigmas must be positive");
                }
                if c1 > c2 {
                    return fail("centers must satisfy c1 <= c2");
                }
            },
            Self::Singleton { point } => {
                if !finite(&[*point]) {
                    return fail("point must be finite");
                }
            },
            Self::Constant { degree } => {
                if !(0. ..=1.).contains(degree) {
                    return fail("degree must lie in [0, 1]");
                }
            },
            Self::SShape { a, b } | Self::ZShape { a, b } => {
                if !finite(&[*a, *b]) {
                    return fail("control points must be finite");
                }
                if a > b {
                    return fail("control points must satisfy a <= b");
                }
            },
            Self::PiShape { a, b, c, d } => {
                if !finite(&[*a, *b, *c, *d]) {
                    return fail("control points must be finite");
                }
                if !(a <= b && b <= c && c <= d) {
                    return fail("control points must satisfy a <= b <= c <= d");
                }
            },
            Self::Piecewise { points } => {
                if points.is_empty() {
                    return fail("at least one point is required");
                }
                for (x, y) in points {
                    if !finite(&[*x, *y]) {
                        return fail("points must be finite");
                    }
                    if !(0. ..=1.).contains(y) {
                        return fail("degrees must lie in [0, 1]");
                    }
                }
                if points.windows(2).any(|w| w[0].0 > w[1].0) {
                    return fail("x coordinates must be non-decreasing");
                }
            },
        }

        Ok(())
    }

    /// Degree of membership of `x`, always within `[0, 1]`.
    pub fn degree(&self, x: f64) -> f64 {
        match *self {
            Self::Triangular { a, b, c } => {
                if x == b {
                    1.
                } else if x < a || x > c {
                    0.
                } else if x < b {
                    (x - a) / (b - a)
                } else {
                    (c - x) / (c - b)
                }
            },
            Self::Trapezoidal { a, b, c, d } => {
                if x < a || x > d {
                    0.
                } else if b <= x && x <= c {
                    1.
                } else if x < b {
                    (x - a) / (b - a)
                } else {
                    (d - x) / (d - c)
                }
            },
            Self::Gaussian { mean, sigma } => gauss(x, mean, sigma),
            Self::Gauss2 {
                sigma1,
                c1,
                sigma2,
                c2,
            } => {
                let left = if x <= c1 { gauss(x, c1, sigma1) } else { 1. };
                let right = if x >= c2 { gauss(x, c2, sigma2) } else { 1. };

                left * right
            },
            Self::Singleton { point } => {
                if x == point {
                    1.
                } else {
                    0.
                }
            },
            Self::Constant { degree } => degree,
            Self::SShape { a, b } => s_curve(x, a, b),
            Self::ZShape { a, b } => 1. - s_curve(x, a, b),
            Self::PiShape { a, b, c, d } => s_curve(x, a, b) * (1. - s_curve(x, c, d)),
            Self::Piecewise { ref points } => interp_one(x, points),
        }
    }

    /// Degrees at every abscissa in `xs`, e.g. a grid for plotting.
    pub fn sample(&self, xs: &[f64]) -> Vec<f64> {
        match self {
            Self::Piecewise { points } => interp(xs, points),
            _ => xs.iter().map(|&x| self.degree(x)).collect(),
        }
    }
}

fn finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

fn gauss(x: f64, mean: f64, sigma: f64) -> f64 {
    (-(x - mean).powi(2) / (2. * sigma.powi(2))).exp()
}

// Spline ramp from 0 at a to 1 at b; a step at a when a == b
fn s_curve(x: f64, a: f64, b: f64) -> f64 {
    if a >= b {
        return if x >= a { 1. } else { 0. };
    }

    let mid = (a + b) / 2.;

    if x <= a {
        0.
    } else if x <= mid {
        2. * ((x - a) / (b - a)).powi(2)
    } else if x < b {
        1. - 2. * ((x - b) / (b - a)).powi(2)
    } else {
        1.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangular() {
        let mf = MembershipFunction::triangular(0., 5., 10.).unwrap();

        assert_eq!(mf.degree(-1.), 0.);
        assert_eq!(mf.degree(0.), 0.);
        assert_eq!(mf.degree(2.5), 0.5);
        assert_eq!(mf.degree(5.), 1.);
        assert_eq!(mf.degree(7.5), 0.5);
        assert_eq!(mf.degree(10.), 0.);
        assert_eq!(mf.degree(10.5), 0.);
    }

    #[test]
    fn test_triangular_degenerate_ramps() {
        let left_step = MembershipFunction::triangular(0., 0., 10.).unwrap();
        let right_step = MembershipFunction::triangular(0., 10., 10.).unwrap();

        assert_eq!(left_step.degree(0.), 1.);
        assert_eq!(left_step.degree(-0.001), 0.);
        assert_eq!(left_step.degree(5.), 0.5);
        assert_eq!(right_step.degree(10.), 1.);
        assert_eq!(right_step.degree(10.001), 0.);
        assert_eq!(right_step.degree(5.), 0.5);
    }

    #[test]
    fn test_trapezoidal() {
        let mf = MembershipFunction::trapezoidal(0., 2., 4., 8.).unwrap();

        assert_eq!(mf.degree(-0.5), 0.);
        assert_eq!(mf.degree(1.), 0.5);
        assert_eq!(mf.degree(2.), 1.);
        assert_eq!(mf.degree(3.), 1.);
        assert_eq!(mf.degree(4.), 1.);
        assert_eq!(mf.degree(6.), 0.5);
        assert_eq!(mf.degree(8.5), 0.);
    }

    #[test]
    fn test_ramps_are_continuous() {
        let shapes = [
            MembershipFunction::triangular(-3., 1., 4.).unwrap(),
            MembershipFunction::trapezoidal(-3., -1., 2., 4.).unwrap(),
            MembershipFunction::pi_shape(-3., -1., 2., 4.).unwrap(),
        ];

        for mf in &shapes {
            let mut prev = mf.degree(-5.);

            for i in 1..=10_000 {
                let x = -5. + i as f64 * 1e-3;
                let y = mf.degree(x);

                assert!((0. ..=1.).contains(&y));
                assert!((y - prev).abs() < 2e-3, "{} jumps at {x}", mf.name());
                prev = y;
            }
        }
    }

    #[test]
    fn test_gaussian() {
        let mf = MembershipFunction::gaussian(2., 0.5).unwrap();

        assert_eq!(mf.degree(2.), 1.);
        assert!((mf.degree(2.5) - (-0.5f64).exp()).abs() < 1e-15);
        assert_eq!(mf.degree(1.5), mf.degree(2.5));
    }

    #[test]
    fn test_gauss2_plateau() {
        let mf = MembershipFunction::gauss2(0.22, 2.25, 0.22, 3.25).unwrap();

        assert_eq!(mf.degree(2.25), 1.);
        assert_eq!(mf.degree(3.), 1.);
        assert_eq!(mf.degree(3.25), 1.);
        assert!(mf.degree(1.5) < 0.01);
        assert!(mf.degree(4.) < 0.01);
    }

    #[test]
    fn test_singleton_and_constant() {
        let single = MembershipFunction::singleton(3.).unwrap();
        let any = MembershipFunction::constant(1.).unwrap();

        assert_eq!(single.degree(3.), 1.);
        assert_eq!(single.degree(3.000001), 0.);
        assert_eq!(any.degree(-1e9), 1.);
    }

    #[test]
    fn test_spline_shapes() {
        let s = MembershipFunction::s_shape(0., 2.).unwrap();
        let z = MembershipFunction::z_shape(0., 2.).unwrap();
        let step = MembershipFunction::s_shape(1., 1.).unwrap();

        assert_eq!(s.degree(0.), 0.);
        assert_eq!(s.degree(1.), 0.5);
        assert_eq!(s.degree(2.), 1.);
        assert_eq!(z.degree(0.), 1.);
        assert_eq!(z.degree(1.), 0.5);
        assert_eq!(z.degree(2.), 0.);
        assert_eq!(step.degree(0.99), 0.);
        assert_eq!(step.degree(1.), 1.);
    }

    #[test]
    fn test_piecewise() {
        let mf = MembershipFunction::piecewise(vec![(175., 0.), (180., 0.2), (185., 0.7), (190., 1.)]).unwrap();

        assert_eq!(mf.degree(150.), 0.);
        assert!((mf.degree(182.5) - 0.45).abs() < 1e-12);
        assert_eq!(mf.degree(200.), 1.);
        assert_eq!(mf.sample(&[175., 190.]), vec![0., 1.]);
    }

    #[test]
    fn test_invalid_parameters() {
        let bad = [
            MembershipFunction::triangular(1., 0., 2.),
            MembershipFunction::trapezoidal(0., 2., 1., 3.),
            MembershipFunction::gaussian(0., 0.),
            MembershipFunction::gaussian(0., -1.),
            MembershipFunction::gauss2(1., 3., 1., 2.),
            MembershipFunction::constant(1.5),
            MembershipFunction::s_shape(2., 1.),
            MembershipFunction::triangular(0., f64::NAN, 1.),
            MembershipFunction::piecewise(vec![]),
            MembershipFunction::piecewise(vec![(1., 0.), (0., 1.)]),
            MembershipFunction::piecewise(vec![(0., 0.), (1., 2.)]),
        ];

        for result in bad {
            assert!(matches!(result, Err(FisError::InvalidParameter { .. })), "{result:?}");
        }
    }

    #[test]
    fn test_serde_shape_tag() {
        let mf = MembershipFunction::trapezoidal(0., 1., 2., 3.).unwrap();
        let json = serde_json::to_string(&mf).unwrap();

        assert!(json.contains("\"shape\":\"trapezoidal\""));
        assert_eq!(serde_json::from_str::<MembershipFunction>(&json).unwrap(), mf);
    }
}
