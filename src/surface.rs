use rayon::prelude::*;
use tracing::debug;

use crate::error::{FisError, Result};
use crate::inputs::Inputs;
use crate::linspace::Linspace;
use crate::sensitivity::Model;

/// One swept input of a [`ResponseSurface`].
#[derive(Clone, Debug, PartialEq)]
pub struct Axis {
    pub variable: String,
    pub samples: usize,
}

impl Axis {
    pub fn new(variable: impl Into<String>, samples: usize) -> Self {
        Self {
            variable: variable.into(),
            samples,
        }
    }
}

/// A model output sampled over a regular grid of two inputs.
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseSurface {
    output: String,
    x_variable: String,
    y_variable: String,
    x: Vec<f64>,
    y: Vec<f64>,
    // Row-major, one row per y sample
    values: Vec<Option<f64>>,
}

impl ResponseSurface {
    /// Sweeps `x_axis` and `y_axis` across their whole domains with every other
    /// input held at its value in `base`.
    ///
    /// Cells where no rule fired for `output` are `None`, whatever the other
    /// outputs do. Any other error aborts the sweep.
    pub fn sample<M: Model + ?Sized>(
        model: &M,
        base: &Inputs,
        x_axis: &Axis,
        y_axis: &Axis,
        output: &str,
    ) -> Result<Self> {
        if !model.output_names().contains(&output) {
            return Err(FisError::UnknownVariable(output.to_owned()));
        }
        if x_axis.variable == y_axis.variable {
            return Err(FisError::invalid(
                "response surface",
                format!("both axes sweep `{}`", x_axis.variable),
            ));
        }

        let domains = model.input_domains();
        let mut grids = Vec::with_capacity(2);

        for axis in [x_axis, y_axis] {
            let &(_, domain) = domains
                .iter()
                .find(|(name, _)| *name == axis.variable)
                .ok_or_else(|| FisError::UnknownVariable(axis.variable.clone()))?;

            if axis.samples < 2 {
                return Err(FisError::invalid(
                    format!("axis `{}`", axis.variable),
                    "at least two samples are required",
                ));
            }

            grids.push(Linspace::new(domain.min(), domain.max(), axis.samples).collect::<Vec<_>>());
        }

        let y = grids.pop().unwrap_or_default();
        let x = grids.pop().unwrap_or_default();

        let cells: Vec<Result<Option<f64>>> = (0..x.len() * y.len())
            .into_par_iter()
            .map(|cell| {
                let point = base
                    .clone()
                    .with(x_axis.variable.as_str(), x[cell % x.len()])
                    .with(y_axis.variable.as_str(), y[cell / x.len()]);

                match model.evaluate_each(&point)?.crisp(output) {
                    Ok(val) => Ok(Some(val)),
                    Err(FisError::NoRuleFired(_)) => Ok(None),
                    Err(err) => Err(err),
                }
            })
            .collect();
        let values = cells.into_iter().collect::<Result<Vec<_>>>()?;

        debug!(
            output,
            cells = values.len(),
            unfired = values.iter().filter(|v| v.is_none()).count(),
            "sampled response surface"
        );

        Ok(Self {
            output: output.to_owned(),
            x_variable: x_axis.variable.clone(),
            y_variable: y_axis.variable.clone(),
            x,
            y,
            values,
        })
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    /// Swept variable and its samples along the x axis.
    pub fn x(&self) -> (&str, &[f64]) {
        (&self.x_variable, &self.x)
    }

    pub fn y(&self) -> (&str, &[f64]) {
        (&self.y_variable, &self.y)
    }

    /// Value at the `ix`-th x sample and `iy`-th y sample.
    pub fn get(&self, ix: usize, iy: usize) -> Option<f64> {
        if ix >= self.x.len() {
            return None;
        }

        self.values.get(iy * self.x.len() + ix).copied().flatten()
    }

    /// Rows of constant y.
    pub fn rows(&self) -> impl Iterator<Item = &[Option<f64>]> {
        self.values.chunks(self.x.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::is;
    use crate::inference::{EngineConfig, InferenceEngine};
    use crate::membership::MembershipFunction;
    use crate::rule_base::RuleBase;
    use crate::rules::Rule;
    use crate::variable::LinguisticVariable;
    use test_log::test;

    fn engine() -> InferenceEngine {
        let var = |name: &str| {
            LinguisticVariable::new(name, 0. ..=10.)
                .and_then(|v| v.with_term("high", MembershipFunction::triangular(0., 10., 10.)?))
                .unwrap()
        };
        let rules = [Rule::new(is("a", "high").and(is("b", "high")), is("y", "high"))];
        let rule_base = RuleBase::build([var("a"), var("b"), var("c")], [var("y")], rules).unwrap();

        InferenceEngine::new(rule_base, EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_surface_grid() {
        let engine = engine();
        let base = Inputs::new().with("a", 5.).with("b", 5.).with("c", 1.);

        let surface = ResponseSurface::sample(&engine, &base, &Axis::new("a", 3), &Axis::new("b", 5), "y").unwrap();

        assert_eq!(surface.x(), ("a", &[0., 5., 10.][..]));
        assert_eq!(surface.y().1.len(), 5);
        assert_eq!(surface.rows().count(), 5);
        // a = 0 never fires
        assert_eq!(surface.get(0, 4), None);
        assert_eq!(surface.get(1, 0), None);
        assert_eq!(surface.get(3, 0), None);

        let direct = engine.evaluate(&base.clone().with("a", 10.).with("b", 7.5)).unwrap();

        assert_eq!(surface.get(2, 3), direct.get("y"));
    }

    #[test]
    fn test_other_outputs_do_not_blank_cells() {
        let var = |name: &str| {
            LinguisticVariable::new(name, 0. ..=1.)
                .and_then(|v| v.with_term("high", MembershipFunction::triangular(0., 1., 1.)?))
                .unwrap()
        };
        let rules = [
            Rule::new(is("a", "high"), is("y", "high")),
            Rule::new(is("b", "high"), is("z", "high")),
        ];
        let rule_base = RuleBase::build([var("a"), var("b")], [var("y"), var("z")], rules).unwrap();
        let engine = InferenceEngine::new(rule_base, EngineConfig::default()).unwrap();
        let base = Inputs::new().with("a", 0.5).with("b", 0.5);

        let surface = ResponseSurface::sample(&engine, &base, &Axis::new("a", 3), &Axis::new("b", 3), "y").unwrap();

        // z never fires along b = 0
        assert!((surface.get(1, 0).unwrap() - 11. / 18.).abs() < 1e-6);
        assert!(surface.get(2, 0).is_some());
        assert_eq!(surface.get(0, 0), None);
        assert_eq!(surface.get(1, 0), surface.get(1, 2));
    }

    #[test]
    fn test_surface_rejects_bad_axes() {
        let engine = engine();
        let base = Inputs::new().with("a", 5.).with("b", 5.).with("c", 1.);
        let sample = |x: Axis, y: Axis, output: &str| ResponseSurface::sample(&engine, &base, &x, &y, output);

        assert_eq!(
            sample(Axis::new("a", 3), Axis::new("z", 3), "y").unwrap_err(),
            FisError::UnknownVariable("z".into())
        );
        assert_eq!(
            sample(Axis::new("a", 3), Axis::new("b", 3), "q").unwrap_err(),
            FisError::UnknownVariable("q".into())
        );
        assert!(sample(Axis::new("a", 3), Axis::new("a", 3), "y").is_err());
        assert!(sample(Axis::new("a", 1), Axis::new("b", 3), "y").is_err());
    }
}
