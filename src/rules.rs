use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dsl::{Expr, Proposition};
use crate::variable::VariableKey;

fn default_weight() -> f64 {
    1.
}

fn is_default_weight(weight: &f64) -> bool {
    *weight == 1.
}

/// One Mamdani rule: `IF premise THEN consequence`.
///
/// The consequence is a single proposition or a conjunction of them, one per
/// output term to shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub premise: Expr,
    pub consequence: Expr,
    #[serde(default = "default_weight", skip_serializing_if = "is_default_weight")]
    pub weight: f64,
}

impl Rule {
    pub fn new(premise: Expr, consequence: Expr) -> Self {
        Self {
            name: None,
            premise,
            consequence,
            weight: 1.,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Weight in `(0, 1]` multiplied into the firing strength; checked at build time.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn antecedents(&self) -> Vec<&Proposition> {
        self.premise.propositions()
    }

    pub fn consequents(&self) -> Vec<&Proposition> {
        self.consequence.propositions()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IF {} THEN {}", self.premise, self.consequence)?;

        if self.weight != 1. {
            write!(f, " [weight {}]", self.weight)?;
        }

        Ok(())
    }
}

/// Rules in authoring order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rules(pub(crate) Vec<Rule>);

impl Rules {
    pub fn new() -> Self {
        Rules(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Rules(Vec::with_capacity(capacity))
    }

    pub fn add(&mut self, premise: Expr, consequence: Expr) {
        self.0.push(Rule::new(premise, consequence));
    }

    pub fn push(&mut self, rule: Rule) {
        self.0.push(rule);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.0.iter()
    }
}

impl FromIterator<Rule> for Rules {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Rules(iter.into_iter().collect())
    }
}

impl IntoIterator for Rules {
    type Item = Rule;
    type IntoIter = std::vec::IntoIter<Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// (variable, index of the term within that variable)
pub(crate) type TermRef = (VariableKey, usize);

/// A rule with every name resolved against its rule base.
#[derive(Clone, Debug)]
pub(crate) struct ResolvedRule {
    pub(crate) premise: Expr<TermRef>,
    pub(crate) consequents: Vec<TermRef>,
    pub(crate) weight: f64,
}

#[test]
fn test_rule_display() {
    use crate::dsl::is;

    let rule = Rule::new(is("temperature", "high").and(is("speed", "fast")), is("effort", "high"));
    let weighted = rule.clone().named("hot_and_fast").with_weight(0.5);

    assert_eq!(rule.to_string(), "IF temperature is high AND speed is fast THEN effort is high");
    assert_eq!(
        weighted.to_string(),
        "IF temperature is high AND speed is fast THEN effort is high [weight 0.5]"
    );
    assert_eq!(weighted.antecedents().len(), 2);
    assert_eq!(weighted.consequents(), vec![&Proposition::new("effort", "high")]);
}

#[test]
fn test_rule_serde_defaults() {
    let json = r#"{
        "premise": {"is": {"variable": "speed", "term": "fast"}},
        "consequence": {"is": {"variable": "effort", "term": "high"}}
    }"#;
    let rule: Rule = serde_json::from_str(json).unwrap();

    assert_eq!(rule.weight, 1.);
    assert_eq!(rule.name, None);
    assert_eq!(serde_json::to_value(&rule).unwrap().get("weight"), None);
}
