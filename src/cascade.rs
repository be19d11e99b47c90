use std::collections::HashMap;
use std::fmt;

use crate::dsl::Proposition;
use crate::error::{FisError, Result};
use crate::inference::{DomainPolicy, InferenceEngine};
use crate::inputs::Inputs;
use crate::outputs::{Evaluation, Inference, Outputs};
use crate::sensitivity::Model;
use crate::variable::Domain;

/// Inference engines chained so that outputs of earlier stages feed the
/// inputs of later ones.
#[derive(Clone, Debug)]
pub struct Cascade {
    stages: Vec<InferenceEngine>,
    /// Inputs no stage produces, in first-use order
    external: Vec<(String, Domain)>,
    producers: HashMap<String, usize>,
}

impl Cascade {
    pub fn new(stages: impl IntoIterator<Item = InferenceEngine>) -> Result<Self> {
        let stages: Vec<InferenceEngine> = stages.into_iter().collect();

        if stages.is_empty() {
            return Err(FisError::invalid("cascade", "at least one stage is required"));
        }

        let mut producers = HashMap::new();

        for (i, stage) in stages.iter().enumerate() {
            for var in stage.rule_base().outputs() {
                if producers.insert(var.name().to_owned(), i).is_some() {
                    return Err(FisError::DuplicateVariable(var.name().to_owned()));
                }
            }
        }

        let mut external: Vec<(String, Domain)> = Vec::new();

        for (i, stage) in stages.iter().enumerate() {
            for var in stage.rule_base().inputs() {
                match producers.get(var.name()) {
                    Some(&producer) if producer >= i => {
                        return Err(FisError::ReferentialIntegrity {
                            owner: format!("stage {i}"),
                            reference: format!("an earlier stage producing `{}`", var.name()),
                        });
                    },
                    Some(_) => {},
                    None if external.iter().any(|(name, _)| name == var.name()) => {},
                    None => external.push((var.name().to_owned(), var.domain())),
                }
            }
        }

        Ok(Self {
            stages,
            external,
            producers,
        })
    }

    pub fn stages(&self) -> &[InferenceEngine] {
        &self.stages
    }

    /// Every stage's outputs, stage by stage. Fails with `NoRuleFired` for the
    /// first output no rule fired for.
    pub fn evaluate(&self, inputs: &Inputs) -> Result<Outputs> {
        self.evaluate_stages(inputs)?.into_outputs()
    }

    /// Runs the stages in order. An output no rule fired for is `None`, and so
    /// is every output of a later stage that consumes it.
    fn evaluate_stages(&self, inputs: &Inputs) -> Result<Evaluation> {
        let mut known = inputs.clone();
        let mut unfired: Vec<&str> = Vec::new();
        let mut evaluation = Evaluation::default();

        for stage in &self.stages {
            let starved = stage.rule_base().inputs().any(|var| unfired.contains(&var.name()));
            let stage_evaluation = if starved {
                Evaluation(
                    stage
                        .rule_base()
                        .outputs()
                        .map(|var| (var.name().to_owned(), None))
                        .collect(),
                )
            } else {
                stage.infer(&known)?.evaluation()
            };

            for var in stage.rule_base().outputs() {
                match stage_evaluation.get(var.name()) {
                    Some(val) => known.add(var.name(), val),
                    None => unfired.push(var.name()),
                }
            }
            evaluation.0.extend(stage_evaluation.0);
        }

        Ok(evaluation)
    }

    /// Traces the decision of the last stage back through the stages that fed it.
    ///
    /// Starting from the last stage, takes its critical rule and the dominant
    /// antecedent of that rule; when the antecedent's variable is produced by an
    /// earlier stage, continues there. Empty if the last stage fired no rule.
    pub fn explain(&self, inputs: &Inputs) -> Result<Vec<Explanation>> {
        let mut known = inputs.clone();
        let mut inferences: Vec<Inference<'_>> = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let inference = stage.infer(&known)?;

            for var in stage.rule_base().outputs() {
                known.add(var.name(), inference.crisp(var.name())?);
            }
            inferences.push(inference);
        }

        let mut explanation = Vec::new();
        let mut current = inferences.len() - 1;

        while let Some(rule) = inferences[current].critical_rule() {
            let inference = &inferences[current];
            let Some((antecedent, degree)) = inference.dominant_antecedent(rule) else {
                break;
            };

            explanation.push(Explanation {
                stage: current,
                rule,
                strength: inference.firing_strengths()[rule],
                antecedent: antecedent.clone(),
                degree,
            });

            match self.producers.get(&antecedent.variable) {
                Some(&producer) => current = producer,
                None => break,
            }
        }

        Ok(explanation)
    }
}

/// One step of a [`Cascade::explain`] trace.
#[derive(Clone, Debug, PartialEq)]
pub struct Explanation {
    pub stage: usize,
    /// Critical rule of the stage
    pub rule: usize,
    pub strength: f64,
    /// Antecedent of `rule` with the largest degree
    pub antecedent: Proposition,
    pub degree: f64,
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stage {} rule {} fired at {:.3}, mostly because {} ({:.3})",
            self.stage, self.rule, self.strength, self.antecedent, self.degree
        )
    }
}

impl Model for Cascade {
    fn input_domains(&self) -> Vec<(&str, Domain)> {
        self.external.iter().map(|(name, domain)| (name.as_str(), *domain)).collect()
    }

    fn output_names(&self) -> Vec<&str> {
        self.stages
            .iter()
            .flat_map(|stage| stage.rule_base().outputs().map(|var| var.name()))
            .collect()
    }

    /// Strict as soon as one stage is strict.
    fn domain_policy(&self) -> DomainPolicy {
        if self.stages.iter().any(|stage| stage.config().domain_policy == DomainPolicy::Strict) {
            DomainPolicy::Strict
        } else {
            DomainPolicy::Clamp
        }
    }

    fn evaluate_each(&self, inputs: &Inputs) -> Result<Evaluation> {
        self.evaluate_stages(inputs)
    }
}
