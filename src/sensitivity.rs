use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FisError, Result};
use crate::inference::{DomainPolicy, InferenceEngine};
use crate::inputs::Inputs;
use crate::outputs::Evaluation;
use crate::variable::Domain;

/// Anything that maps crisp inputs to crisp outputs over bounded input domains.
pub trait Model: Sync {
    /// Input variables and their domains, in declaration order.
    fn input_domains(&self) -> Vec<(&str, Domain)>;

    fn output_names(&self) -> Vec<&str>;

    fn domain_policy(&self) -> DomainPolicy;

    /// Crisp value per output. An output no rule fired for is `None` rather
    /// than an error, so callers decide which outputs they need.
    fn evaluate_each(&self, inputs: &Inputs) -> Result<Evaluation>;
}

impl Model for InferenceEngine {
    fn input_domains(&self) -> Vec<(&str, Domain)> {
        self.rule_base().inputs().map(|var| (var.name(), var.domain())).collect()
    }

    fn output_names(&self) -> Vec<&str> {
        self.rule_base().outputs().map(|var| var.name()).collect()
    }

    fn domain_policy(&self) -> DomainPolicy {
        self.config().domain_policy
    }

    fn evaluate_each(&self, inputs: &Inputs) -> Result<Evaluation> {
        Ok(self.infer(inputs)?.evaluation())
    }
}

/// Finite-difference step per input variable.
///
/// Variables without an explicit step use `relative` times their domain width.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepSizes {
    relative: f64,
    #[serde(default)]
    absolute: HashMap<String, f64>,
}

impl Default for StepSizes {
    fn default() -> Self {
        Self {
            relative: 1e-3,
            absolute: HashMap::new(),
        }
    }
}

impl StepSizes {
    pub fn relative(fraction: f64) -> Result<Self> {
        let steps = Self {
            relative: fraction,
            absolute: HashMap::new(),
        };

        steps.validate()?;

        Ok(steps)
    }

    /// Overrides the step of one variable with an absolute value.
    pub fn with(mut self, variable: impl Into<String>, step: f64) -> Result<Self> {
        self.absolute.insert(variable.into(), step);
        self.validate()?;

        Ok(self)
    }

    pub fn step(&self, variable: &str, domain: Domain) -> f64 {
        self.absolute
            .get(variable)
            .copied()
            .unwrap_or(self.relative * domain.width())
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |h: f64| h.is_finite() && h > 0.;

        if !positive(self.relative) {
            return Err(FisError::invalid("relative step", format!("{} must be positive", self.relative)));
        }
        if let Some((var, h)) = self.absolute.iter().find(|(_, h)| !positive(**h)) {
            return Err(FisError::invalid(format!("step of `{var}`"), format!("{h} must be positive")));
        }

        Ok(())
    }
}

/// Partial derivatives of outputs with respect to inputs.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    inputs: Vec<String>,
    outputs: Vec<String>,
    // One row per output, one column per input
    values: Vec<f64>,
}

impl Gradient {
    pub fn get(&self, input: &str, output: &str) -> Option<f64> {
        let column = self.inputs.iter().position(|name| name == input)?;

        self.row(output).map(|row| row[column])
    }

    /// Derivatives of `output` in model input order.
    pub fn row(&self, output: &str) -> Option<&[f64]> {
        let row = self.outputs.iter().position(|name| name == output)?;
        let width = self.inputs.len();

        Some(&self.values[row * width..(row + 1) * width])
    }

    pub fn inputs(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(String::as_str)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(String::as_str)
    }

    /// `(input, output, derivative)` for every pair, output by output.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.outputs.iter().enumerate().flat_map(move |(row, output)| {
            let width = self.inputs.len();

            self.inputs
                .iter()
                .enumerate()
                .map(move |(column, input)| (input.as_str(), output.as_str(), self.values[row * width + column]))
        })
    }
}

/// Central-difference sensitivities of a [`Model`].
pub struct SensitivityEngine<'m, M: ?Sized> {
    model: &'m M,
}

impl<'m, M: Model + ?Sized> SensitivityEngine<'m, M> {
    pub fn new(model: &'m M) -> Self {
        Self { model }
    }

    /// Gradient of `outputs` (all of them if empty) at `inputs`.
    ///
    /// Every input `x` is perturbed to `x + h` and `x - h`, each clamped to the
    /// domain, and the derivative is `(f(x+) - f(x-)) / (x+ - x-)`. That is
    /// exactly two model evaluations per input, run in parallel. Errors are
    /// returned as is, in input order, and an unfired output only fails the
    /// gradient when it is one of `outputs`.
    pub fn gradient(&self, inputs: &Inputs, outputs: &[&str], steps: &StepSizes) -> Result<Gradient> {
        steps.validate()?;

        let known = self.model.output_names();
        let outputs: Vec<String> = if outputs.is_empty() {
            known.iter().map(|name| name.to_string()).collect()
        } else {
            outputs
                .iter()
                .map(|&name| {
                    if known.contains(&name) {
                        Ok(name.to_owned())
                    } else {
                        Err(FisError::UnknownVariable(name.to_owned()))
                    }
                })
                .collect::<Result<_>>()?
        };

        let policy = self.model.domain_policy();
        let domains = self.model.input_domains();
        let mut base = inputs.clone();
        let mut points = Vec::with_capacity(domains.len());

        for &(name, domain) in &domains {
            let value = inputs
                .get(name)
                .ok_or_else(|| FisError::MissingInput(name.to_owned()))?;
            let x = policy.apply(name, value, domain)?;
            let h = steps.step(name, domain);
            let (xp, xm) = (domain.clamp(x + h), domain.clamp(x - h));

            // Both perturbations rounded back onto x
            if xp <= xm {
                return Err(FisError::invalid(
                    format!("step of `{name}`"),
                    format!("{h} does not move {x} at floating-point precision"),
                ));
            }

            base.add(name, x);
            points.push((xp, xm));
        }

        let evaluations: Vec<Result<Evaluation>> = (0..2 * domains.len())
            .into_par_iter()
            .map(|j| {
                let (name, _) = domains[j / 2];
                let (xp, xm) = points[j / 2];
                let x = if j % 2 == 0 { xp } else { xm };

                self.model.evaluate_each(&base.clone().with(name, x))
            })
            .collect();
        let evaluations = evaluations.into_iter().collect::<Result<Vec<_>>>()?;

        debug!(inputs = domains.len(), evaluations = evaluations.len(), "computed finite differences");

        let width = domains.len();
        let mut values = vec![0.; outputs.len() * width];

        for (column, (pair, &(xp, xm))) in evaluations.chunks_exact(2).zip(&points).enumerate() {
            for (row, output) in outputs.iter().enumerate() {
                let fp = pair[0].crisp(output)?;
                let fm = pair[1].crisp(output)?;

                values[row * width + column] = (fp - fm) / (xp - xm);
            }
        }

        Ok(Gradient {
            inputs: domains.iter().map(|(name, _)| name.to_string()).collect(),
            outputs,
            values,
        })
    }
}
