use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dsl::{Expr, Proposition};
use crate::error::{FisError, Result};
use crate::membership::MembershipFunction;
use crate::rules::{ResolvedRule, Rule, Rules, TermRef};
use crate::variable::{LinguisticVariable, VariableKey, Variables};

/// Everything needed to build a [`RuleBase`], as plain (de)serializable data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub inputs: Vec<LinguisticVariable>,
    pub outputs: Vec<LinguisticVariable>,
    #[serde(default)]
    pub rules: Rules,
}

impl ModelDefinition {
    pub fn build(self) -> Result<RuleBase> {
        RuleBase::build(self.inputs, self.outputs, self.rules)
    }
}

/// Input and output variables plus the rules over them.
///
/// A rule base is checked once, when built, and is immutable afterwards. To
/// change a model, edit its [`ModelDefinition`] and build again.
#[derive(Clone, Debug)]
pub struct RuleBase {
    variables: Variables,
    inputs: Vec<VariableKey>,
    outputs: Vec<VariableKey>,
    rules: Vec<Rule>,
    resolved: Vec<ResolvedRule>,
}

impl RuleBase {
    pub fn build(
        inputs: impl IntoIterator<Item = LinguisticVariable>,
        outputs: impl IntoIterator<Item = LinguisticVariable>,
        rules: impl IntoIterator<Item = Rule>,
    ) -> Result<Self> {
        let mut variables = Variables::new();
        let inputs = inputs
            .into_iter()
            .map(|var| variables.insert(var))
            .collect::<Result<Vec<_>>>()?;
        let outputs = outputs
            .into_iter()
            .map(|var| variables.insert(var))
            .collect::<Result<Vec<_>>>()?;

        if outputs.is_empty() {
            return Err(FisError::invalid("rule base", "at least one output variable is required"));
        }

        let rules: Vec<Rule> = rules.into_iter().collect();
        let resolved = rules
            .iter()
            .enumerate()
            .map(|(i, rule)| resolve(i, rule, &variables, &inputs, &outputs))
            .collect::<Result<Vec<_>>>()?;

        info!(
            inputs = inputs.len(),
            outputs = outputs.len(),
            rules = rules.len(),
            "built rule base"
        );

        Ok(Self {
            variables,
            inputs,
            outputs,
            rules,
            resolved,
        })
    }

    pub fn inputs(&self) -> impl Iterator<Item = &LinguisticVariable> + '_ {
        self.inputs.iter().map(|key| &self.variables[*key])
    }

    pub fn outputs(&self) -> impl Iterator<Item = &LinguisticVariable> + '_ {
        self.outputs.iter().map(|key| &self.variables[*key])
    }

    pub fn variable(&self, name: &str) -> Option<&LinguisticVariable> {
        self.variables.get(name)
    }

    pub fn is_input(&self, name: &str) -> bool {
        self.variables.key(name).is_some_and(|key| self.inputs.contains(&key))
    }

    pub fn is_output(&self, name: &str) -> bool {
        self.variables.key(name).is_some_and(|key| self.outputs.contains(&key))
    }

    /// `(variable, term, membership function)` for every term, inputs first.
    pub fn terms(&self) -> impl Iterator<Item = (&str, &str, &MembershipFunction)> + '_ {
        self.inputs().chain(self.outputs()).flat_map(|var| {
            var.terms()
                .iter()
                .map(move |(label, function)| (var.name(), label, function))
        })
    }

    /// Rules with their index, in authoring order.
    pub fn rules(&self) -> impl Iterator<Item = (usize, &Rule)> + '_ {
        self.rules.iter().enumerate()
    }

    pub fn rule(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn to_definition(&self) -> ModelDefinition {
        ModelDefinition {
            inputs: self.inputs().cloned().collect(),
            outputs: self.outputs().cloned().collect(),
            rules: self.rules.iter().cloned().collect(),
        }
    }

    pub(crate) fn input_keys(&self) -> &[VariableKey] {
        &self.inputs
    }

    pub(crate) fn output_keys(&self) -> &[VariableKey] {
        &self.outputs
    }

    pub(crate) fn resolved(&self) -> &[ResolvedRule] {
        &self.resolved
    }

    pub(crate) fn variables(&self) -> &Variables {
        &self.variables
    }
}

fn rule_owner(index: usize, rule: &Rule) -> String {
    match &rule.name {
        Some(name) => format!("rule {index} (`{name}`)"),
        None => format!("rule {index}"),
    }
}

fn resolve(
    index: usize,
    rule: &Rule,
    variables: &Variables,
    inputs: &[VariableKey],
    outputs: &[VariableKey],
) -> Result<ResolvedRule> {
    let owner = rule_owner(index, rule);

    if !(rule.weight > 0. && rule.weight <= 1.) {
        return Err(FisError::invalid(&owner, format!("weight {} must lie in (0, 1]", rule.weight)));
    }
    if has_empty_group(&rule.premise) {
        return Err(FisError::invalid(&owner, "premise contains an empty AND/OR group"));
    }

    let lookup = |prop: &Proposition, allowed: &[VariableKey], role: &str| -> Result<TermRef> {
        let key = variables
            .key(&prop.variable)
            .filter(|key| allowed.contains(key))
            .ok_or_else(|| FisError::ReferentialIntegrity {
                owner: owner.clone(),
                reference: format!("{role} variable `{}`", prop.variable),
            })?;
        let term = variables[key]
            .terms()
            .position(&prop.term)
            .ok_or_else(|| FisError::ReferentialIntegrity {
                owner: owner.clone(),
                reference: format!("term `{}` of variable `{}`", prop.term, prop.variable),
            })?;

        Ok((key, term))
    };

    let premise = rule.premise.try_map(&mut |prop| lookup(prop, inputs, "input"))?;

    if !is_conjunction(&rule.consequence) {
        return Err(FisError::invalid(
            &owner,
            "consequence must be one proposition or a conjunction of propositions",
        ));
    }

    let consequents = rule
        .consequence
        .propositions()
        .into_iter()
        .map(|prop| lookup(prop, outputs, "output"))
        .collect::<Result<Vec<_>>>()?;

    if consequents.is_empty() {
        return Err(FisError::invalid(&owner, "consequence names no output term"));
    }

    Ok(ResolvedRule {
        premise,
        consequents,
        weight: rule.weight,
    })
}

fn has_empty_group<P>(expr: &Expr<P>) -> bool {
    match expr {
        Expr::Is(_) => false,
        Expr::And(exprs) | Expr::Or(exprs) => exprs.is_empty() || exprs.iter().any(has_empty_group),
    }
}

fn is_conjunction<P>(expr: &Expr<P>) -> bool {
    match expr {
        Expr::Is(_) => true,
        Expr::And(exprs) => exprs.iter().all(is_conjunction),
        Expr::Or(_) => false,
    }
}

impl fmt::Display for RuleBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (kind, vars) in [("Input", &self.inputs), ("Output", &self.outputs)] {
            for key in vars {
                let var = &self.variables[*key];
                let labels: Vec<_> = var.terms().iter().map(|(label, _)| label).collect();

                writeln!(f, "{kind} {} {}: {}", var.name(), var.domain(), labels.join(", "))?;
            }
        }

        for (i, rule) in self.rules() {
            writeln!(f, "{}: {rule}", rule_owner(i, rule).replacen("rule", "Rule", 1))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::is;

    fn speed() -> LinguisticVariable {
        LinguisticVariable::new("speed", 0. ..=10.)
            .and_then(|v| v.with_term("slow", MembershipFunction::triangular(0., 0., 5.)?))
            .and_then(|v| v.with_term("fast", MembershipFunction::triangular(5., 10., 10.)?))
            .unwrap()
    }

    fn effort() -> LinguisticVariable {
        LinguisticVariable::new("effort", 0. ..=1.)
            .and_then(|v| v.with_term("low", MembershipFunction::triangular(0., 0., 0.5)?))
            .and_then(|v| v.with_term("high", MembershipFunction::triangular(0.5, 1., 1.)?))
            .unwrap()
    }

    #[test]
    fn test_build_and_introspect() {
        let rules = [
            Rule::new(is("speed", "slow"), is("effort", "low")).named("cruise"),
            Rule::new(is("speed", "fast"), is("effort", "high")).with_weight(0.8),
        ];
        let rule_base = RuleBase::build([speed()], [effort()], rules).unwrap();

        let terms: Vec<_> = rule_base.terms().map(|(var, label, _)| format!("{var}.{label}")).collect();

        assert_eq!(terms, ["speed.slow", "speed.fast", "effort.low", "effort.high"]);
        assert_eq!(rule_base.len(), 2);
        assert!(rule_base.is_input("speed"));
        assert!(rule_base.is_output("effort"));
        assert!(!rule_base.is_input("effort"));
        assert_eq!(rule_base.rule(1).map(|r| r.weight), Some(0.8));
        assert_eq!(
            rule_base.to_string(),
            "Input speed [0, 10]: slow, fast\n\
             Output effort [0, 1]: low, high\n\
             Rule 0 (`cruise`): IF speed is slow THEN effort is low\n\
             Rule 1: IF speed is fast THEN effort is high [weight 0.8]\n"
        );
    }

    #[test]
    fn test_unknown_term_is_rejected() {
        let rules = [Rule::new(is("speed", "ludicrous"), is("effort", "high"))];

        let err = RuleBase::build([speed()], [effort()], rules).unwrap_err();

        assert_eq!(
            err,
            FisError::ReferentialIntegrity {
                owner: "rule 0".into(),
                reference: "term `ludicrous` of variable `speed`".into()
            }
        );
    }

    #[test]
    fn test_variable_roles_are_enforced() {
        let output_in_premise = [Rule::new(is("effort", "high"), is("effort", "low"))];
        let input_in_consequence = [Rule::new(is("speed", "fast"), is("speed", "slow"))];
        let unknown = [Rule::new(is("torque", "high"), is("effort", "low"))];

        for rules in [output_in_premise, input_in_consequence, unknown] {
            assert!(matches!(
                RuleBase::build([speed()], [effort()], rules),
                Err(FisError::ReferentialIntegrity { .. })
            ));
        }
    }

    #[test]
    fn test_malformed_rules() {
        let disjunctive_consequence = Rule::new(is("speed", "fast"), is("effort", "high").or(is("effort", "low")));
        let zero_weight = Rule::new(is("speed", "fast"), is("effort", "high")).with_weight(0.);
        let heavy = Rule::new(is("speed", "fast"), is("effort", "high")).with_weight(1.5);
        let empty_group = Rule::new(Expr::And(vec![]), is("effort", "high"));

        for rule in [disjunctive_consequence, zero_weight, heavy, empty_group] {
            assert!(matches!(
                RuleBase::build([speed()], [effort()], [rule]),
                Err(FisError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn test_duplicate_variable_across_roles() {
        let err = RuleBase::build([speed()], [speed()], Rules::new()).unwrap_err();

        assert_eq!(err, FisError::DuplicateVariable("speed".into()));
    }

    #[test]
    fn test_definition_is_revalidated() {
        let json = r#"{
            "inputs": [{"name": "speed", "domain": [0.0, 10.0], "terms": [
                {"label": "fast", "function": {"shape": "gaussian", "mean": 10.0, "sigma": -1.0}}
            ]}],
            "outputs": [{"name": "effort", "domain": [0.0, 1.0]}]
        }"#;
        let definition: ModelDefinition = serde_json::from_str(json).unwrap();

        assert!(matches!(definition.build(), Err(FisError::InvalidParameter { .. })));
    }

    #[test]
    fn test_definition_round_trip() {
        let rules = [Rule::new(is("speed", "fast"), is("effort", "high")).named("push")];
        let rule_base = RuleBase::build([speed()], [effort()], rules).unwrap();
        let definition = rule_base.to_definition();

        let json = serde_json::to_string(&definition).unwrap();
        let rebuilt = serde_json::from_str::<ModelDefinition>(&json).unwrap().build().unwrap();

        assert_eq!(rebuilt.to_definition(), definition);
    }
}
