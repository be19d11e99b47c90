use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use tracing::{debug, trace};

use crate::error::{FisError, Result};
use crate::inputs::Inputs;
use crate::linspace::Linspace;
use crate::ops::*;
use crate::outputs::{Inference, Outputs, Profile};
use crate::rule_base::RuleBase;
use crate::rules::TermRef;
use crate::variable::{Domain, VariableKey};

/// What to do with an input that lies outside its variable's domain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainPolicy {
    /// Move the value onto the nearest bound. Every clamp is logged at debug level.
    #[default]
    Clamp,
    /// Fail with `InputOutOfDomain`.
    Strict,
}

impl DomainPolicy {
    /// Checks a crisp value for `variable` and applies the policy to it.
    pub fn apply(self, variable: &str, value: f64, domain: Domain) -> Result<f64> {
        if !value.is_finite() {
            return Err(FisError::NonFiniteInput {
                variable: variable.to_owned(),
                value,
            });
        }
        if domain.contains(value) {
            return Ok(value);
        }

        match self {
            Self::Clamp => {
                let clamped = domain.clamp(value);

                debug!(variable, value, clamped, "clamped input to its domain");

                Ok(clamped)
            },
            Self::Strict => Err(FisError::InputOutOfDomain {
                variable: variable.to_owned(),
                value,
                min: domain.min(),
                max: domain.max(),
            }),
        }
    }
}

/// Engine settings. The defaults are the canonical Mamdani system: min/max
/// connectives, clipping, max aggregation and centroid defuzzification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Samples of the integration grid spanning each output domain
    pub resolution: usize,
    pub domain_policy: DomainPolicy,
    pub and_op: AndOp,
    pub or_op: OrOp,
    pub implication: ImplicationOp,
    pub aggregation: AggregationOp,
    pub defuzzification: DefuzzificationOp,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resolution: 1001,
            domain_policy: DomainPolicy::default(),
            and_op: AndOp::default(),
            or_op: OrOp::default(),
            implication: ImplicationOp::default(),
            aggregation: AggregationOp::default(),
            defuzzification: DefuzzificationOp::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_domain_policy(mut self, domain_policy: DomainPolicy) -> Self {
        self.domain_policy = domain_policy;
        self
    }

    pub fn with_and_op(mut self, and_op: AndOp) -> Self {
        self.and_op = and_op;
        self
    }

    pub fn with_or_op(mut self, or_op: OrOp) -> Self {
        self.or_op = or_op;
        self
    }

    pub fn with_implication(mut self, implication: ImplicationOp) -> Self {
        self.implication = implication;
        self
    }

    pub fn with_aggregation(mut self, aggregation: AggregationOp) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_defuzzification(mut self, defuzzification: DefuzzificationOp) -> Self {
        self.defuzzification = defuzzification;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.resolution < 2 {
            return Err(FisError::invalid(
                "engine config",
                format!("resolution {} must be at least 2", self.resolution),
            ));
        }

        Ok(())
    }
}

/// An output domain sampled once, with every term of the output sampled on it.
#[derive(Clone, Debug)]
struct OutputGrid {
    universe: Vec<f64>,
    terms: Vec<Vec<f64>>,
}

/// Mamdani inference over an immutable [`RuleBase`].
///
/// Output grids are built once at construction, so repeated evaluation of the
/// same inputs is bit-for-bit reproducible and `&self` can be shared between
/// threads freely.
#[derive(Clone, Debug)]
pub struct InferenceEngine {
    rule_base: RuleBase,
    config: EngineConfig,
    grids: SecondaryMap<VariableKey, OutputGrid>,
}

impl InferenceEngine {
    pub fn new(rule_base: RuleBase, config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let mut grids = SecondaryMap::with_capacity(rule_base.output_keys().len());

        for &key in rule_base.output_keys() {
            let var = &rule_base.variables()[key];
            let domain = var.domain();
            let universe: Vec<f64> = Linspace::new(domain.min(), domain.max(), config.resolution).collect();
            let terms = var.terms().iter().map(|(_, function)| function.sample(&universe)).collect();

            grids.insert(key, OutputGrid { universe, terms });
        }

        debug!(resolution = config.resolution, defuzzification = ?config.defuzzification, "prepared output grids");

        Ok(Self {
            rule_base,
            config,
            grids,
        })
    }

    pub fn rule_base(&self) -> &RuleBase {
        &self.rule_base
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs every stage of the inference and keeps the intermediate results.
    ///
    /// Values in `inputs` for variables the rule base does not declare are
    /// ignored. An output no rule fired for has no crisp value, which is not an
    /// error until it is asked for.
    pub fn infer(&self, inputs: &Inputs) -> Result<Inference<'_>> {
        let EngineConfig {
            domain_policy,
            and_op,
            or_op,
            implication,
            aggregation,
            defuzzification,
            ..
        } = self.config;
        let variables = self.rule_base.variables();

        // Fuzzification
        let mut degrees = SecondaryMap::with_capacity(self.rule_base.input_keys().len());

        for &key in self.rule_base.input_keys() {
            let var = &variables[key];
            let value = inputs
                .get(var.name())
                .ok_or_else(|| FisError::MissingInput(var.name().to_owned()))?;
            let value = domain_policy.apply(var.name(), value, var.domain())?;

            degrees.insert(key, var.degrees(value));
        }

        // Firing strengths
        let degree = |&(key, term): &TermRef| degrees[key][term];
        let firing: Vec<f64> = self
            .rule_base
            .resolved()
            .iter()
            .enumerate()
            .map(|(i, rule)| {
                let strength = rule.premise.eval(&degree, and_op, or_op) * rule.weight;

                trace!(rule = i, strength, "firing strength");

                strength
            })
            .collect();

        // Implication, aggregation and defuzzification, per output
        let mut profiles = Vec::with_capacity(self.rule_base.output_keys().len());
        let mut crisp = Vec::with_capacity(profiles.capacity());

        for &key in self.rule_base.output_keys() {
            let grid = &self.grids[key];
            let mut membership = vec![0.; grid.universe.len()];

            for (rule, &strength) in self.rule_base.resolved().iter().zip(&firing) {
                if strength <= 0. {
                    continue;
                }

                for &(_, term) in rule.consequents.iter().filter(|(var, _)| *var == key) {
                    let implied = grid.terms[term].iter().map(|&m| implication.call(strength, m));

                    aggregation.accumulate(&mut membership, implied);
                }
            }

            crisp.push(defuzzification.call(&grid.universe, &membership));
            profiles.push(Profile {
                variable: variables[key].name(),
                universe: &grid.universe,
                membership,
            });
        }

        Ok(Inference {
            rule_base: &self.rule_base,
            degrees,
            firing,
            profiles,
            crisp,
        })
    }

    /// Crisp value of every output, failing with `NoRuleFired` for the first
    /// output (in declaration order) that nothing fired for.
    pub fn evaluate(&self, inputs: &Inputs) -> Result<Outputs> {
        self.infer(inputs)?.into_outputs()
    }
}
