use slotmap::SecondaryMap;

use crate::dsl::Proposition;
use crate::error::{FisError, Result};
use crate::inputs::Inputs;
use crate::rule_base::RuleBase;
use crate::variable::VariableKey;

/// Crisp output values, in output declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outputs(pub(crate) Vec<(String, f64)>);

impl Outputs {
    pub fn get(&self, var: &str) -> Option<f64> {
        self.0.iter().find(|(name, _)| name == var).map(|(_, val)| *val)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, val)| (name.as_str(), *val))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Crisp value of every output in declaration order, `None` where no rule
/// fired for that output.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Evaluation(pub(crate) Vec<(String, Option<f64>)>);

impl Evaluation {
    /// `UnknownVariable` if the model has no such output, `NoRuleFired` if it
    /// has no value.
    pub fn crisp(&self, output: &str) -> Result<f64> {
        let (_, crisp) = self
            .0
            .iter()
            .find(|(name, _)| name == output)
            .ok_or_else(|| FisError::UnknownVariable(output.to_owned()))?;

        crisp.ok_or_else(|| FisError::NoRuleFired(output.to_owned()))
    }

    pub fn get(&self, output: &str) -> Option<f64> {
        self.crisp(output).ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.0.iter().map(|(name, crisp)| (name.as_str(), *crisp))
    }

    /// Fails on the first output (in declaration order) no rule fired for.
    pub fn into_outputs(self) -> Result<Outputs> {
        self.0
            .into_iter()
            .map(|(name, crisp)| match crisp {
                Some(val) => Ok((name, val)),
                None => Err(FisError::NoRuleFired(name)),
            })
            .collect::<Result<Vec<_>>>()
            .map(Outputs)
    }
}

impl From<Outputs> for Inputs {
    fn from(outputs: Outputs) -> Self {
        outputs.0.into_iter().collect()
    }
}

/// Aggregated membership of one output over the engine's integration grid.
#[derive(Clone, Debug)]
pub struct Profile<'e> {
    pub variable: &'e str,
    pub universe: &'e [f64],
    pub membership: Vec<f64>,
}

/// Everything one evaluation computed, for reasoning and plotting.
#[derive(Clone, Debug)]
pub struct Inference<'e> {
    pub(crate) rule_base: &'e RuleBase,
    pub(crate) degrees: SecondaryMap<VariableKey, Vec<f64>>,
    pub(crate) firing: Vec<f64>,
    pub(crate) profiles: Vec<Profile<'e>>,
    pub(crate) crisp: Vec<Option<f64>>,
}

impl<'e> Inference<'e> {
    /// Crisp value of an output; `NoRuleFired` if its aggregate is empty.
    pub fn crisp(&self, output: &str) -> Result<f64> {
        let index = self.output_index(output)?;

        self.crisp[index].ok_or_else(|| FisError::NoRuleFired(output.to_owned()))
    }

    /// Crisp value of an output, or `fallback` when no rule fired for it.
    pub fn crisp_or(&self, output: &str, fallback: f64) -> Result<f64> {
        let index = self.output_index(output)?;

        Ok(self.crisp[index].unwrap_or(fallback))
    }

    /// Firing strength of every rule, weight included, in rule order.
    pub fn firing_strengths(&self) -> &[f64] {
        &self.firing
    }

    pub fn profile(&self, output: &str) -> Option<&Profile<'e>> {
        self.profiles.iter().find(|profile| profile.variable == output)
    }

    pub fn profiles(&self) -> &[Profile<'e>] {
        &self.profiles
    }

    /// Degree of the (clamped) input in each of its terms.
    pub fn fuzzified(&self, input: &str) -> Option<Vec<(&'e str, f64)>> {
        let key = self.rule_base.variables().key(input)?;
        let degrees = self.degrees.get(key)?;
        let var = &self.rule_base.variables()[key];

        Some(var.terms().iter().map(|(label, _)| label).zip(degrees.iter().copied()).collect())
    }

    /// Rule with the largest firing strength, lowest index on ties.
    pub fn critical_rule(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;

        for (i, strength) in self.firing.iter().copied().enumerate() {
            if strength > best.map_or(0., |(_, s)| s) {
                best = Some((i, strength));
            }
        }

        best.map(|(i, _)| i)
    }

    /// The antecedent of `rule` with the largest membership degree, first on ties.
    pub fn dominant_antecedent(&self, rule: usize) -> Option<(&'e Proposition, f64)> {
        let authored = self.rule_base.rule(rule)?.antecedents();
        let resolved = self.rule_base.resolved().get(rule)?.premise.propositions();
        let mut best: Option<(&'e Proposition, f64)> = None;

        for (prop, (key, term)) in authored.into_iter().zip(resolved) {
            let degree = self.degrees[*key][*term];

            if best.is_none_or(|(_, d)| degree > d) {
                best = Some((prop, degree));
            }
        }

        best
    }

    /// Crisp value or `None` per output, in declaration order.
    pub fn evaluation(&self) -> Evaluation {
        Evaluation(
            self.rule_base
                .outputs()
                .zip(&self.crisp)
                .map(|(var, crisp)| (var.name().to_owned(), *crisp))
                .collect(),
        )
    }

    /// Crisp outputs; fails on the first output (in declaration order) no rule fired for.
    pub fn into_outputs(self) -> Result<Outputs> {
        self.evaluation().into_outputs()
    }

    fn output_index(&self, output: &str) -> Result<usize> {
        self.rule_base
            .outputs()
            .position(|var| var.name() == output)
            .ok_or_else(|| FisError::UnknownVariable(output.to_owned()))
    }
}
