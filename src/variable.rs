use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use crate::error::{FisError, Result};
use crate::membership::MembershipFunction;
use crate::terms::Terms;

new_key_type! {
    /// A variable key
    pub struct VariableKey;
}

/// A closed, non-degenerate real interval `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct Domain {
    min: f64,
    max: f64,
}

impl Domain {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(FisError::invalid("domain", "bounds must be finite"));
        }
        if min >= max {
            return Err(FisError::invalid("domain", format!("[{min}, {max}] must have min < max")));
        }

        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn midpoint(&self) -> f64 {
        self.min + self.width() / 2.
    }

    pub fn contains(&self, x: f64) -> bool {
        self.min <= x && x <= self.max
    }

    pub fn clamp(&self, x: f64) -> f64 {
        x.clamp(self.min, self.max)
    }
}

impl TryFrom<RangeInclusive<f64>> for Domain {
    type Error = FisError;

    fn try_from(range: RangeInclusive<f64>) -> Result<Self> {
        Domain::new(*range.start(), *range.end())
    }
}

impl TryFrom<[f64; 2]> for Domain {
    type Error = FisError;

    fn try_from([min, max]: [f64; 2]) -> Result<Self> {
        Domain::new(min, max)
    }
}

impl From<Domain> for [f64; 2] {
    fn from(domain: Domain) -> Self {
        [domain.min, domain.max]
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// A named quantity over a domain, described by linguistic terms.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinguisticVariable {
    name: String,
    domain: Domain,
    #[serde(default)]
    terms: Terms,
}

impl LinguisticVariable {
    pub fn new(name: impl Into<String>, universe_range: RangeInclusive<f64>) -> Result<Self> {
        let name = name.into();

        if name.is_empty() {
            return Err(FisError::invalid("variable", "name must not be empty"));
        }

        Ok(Self {
            domain: Domain::try_from(universe_range)?,
            name,
            terms: Terms::new(),
        })
    }

    /// Builder form of [`LinguisticVariable::add_term`].
    pub fn with_term(mut self, label: impl Into<String>, function: MembershipFunction) -> Result<Self> {
        self.add_term(label, function)?;

        Ok(self)
    }

    pub fn add_term(&mut self, label: impl Into<String>, function: MembershipFunction) -> Result<()> {
        let label = label.into();

        if self.terms.position(&label).is_some() {
            return Err(FisError::DuplicateTerm {
                variable: self.name.clone(),
                term: label,
            });
        }

        function.validate()?;
        self.terms.push(label, function);

        Ok(())
    }

    pub fn replace_term(&mut self, label: &str, function: MembershipFunction) -> Result<()> {
        let Some(index) = self.terms.position(label) else {
            return Err(FisError::ReferentialIntegrity {
                owner: format!("variable `{}`", self.name),
                reference: format!("term `{label}`"),
            });
        };

        function.validate()?;
        self.terms.replace(index, function);

        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn terms(&self) -> &Terms {
        &self.terms
    }

    /// Degree of `x` in every term, in term order.
    pub fn fuzzify(&self, x: f64) -> Vec<(&str, f64)> {
        self.terms.iter().map(|(label, mf)| (label, mf.degree(x))).collect()
    }

    pub(crate) fn degrees(&self, x: f64) -> Vec<f64> {
        self.terms.iter().map(|(_, mf)| mf.degree(x)).collect()
    }

    /// Re-checks everything a deserialized variable may have skipped.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(FisError::invalid("variable", "name must not be empty"));
        }
        if let Some(label) = self.terms.duplicate_label() {
            return Err(FisError::DuplicateTerm {
                variable: self.name.clone(),
                term: label.to_owned(),
            });
        }
        for (_, function) in self.terms.iter() {
            function.validate()?;
        }

        Ok(())
    }
}

/// Storage for the variables of one rule base, addressable by key or name.
#[derive(Clone, Debug, Default)]
pub(crate) struct Variables {
    slots: SlotMap<VariableKey, LinguisticVariable>,
    by_name: HashMap<String, VariableKey>,
}

impl Variables {
    pub(crate) fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            by_name: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, var: LinguisticVariable) -> Result<VariableKey> {
        var.validate()?;

        if self.by_name.contains_key(var.name()) {
            return Err(FisError::DuplicateVariable(var.name().to_owned()));
        }

        let name = var.name().to_owned();
        let key = self.slots.insert(var);

        self.by_name.insert(name, key);

        Ok(key)
    }

    pub(crate) fn key(&self, name: &str) -> Option<VariableKey> {
        self.by_name.get(name).copied()
    }

    pub(crate) fn get(&self, name: &str) -> Option<&LinguisticVariable> {
        self.key(name).map(|key| &self.slots[key])
    }
}

impl std::ops::Index<VariableKey> for Variables {
    type Output = LinguisticVariable;

    fn index(&self, key: VariableKey) -> &LinguisticVariable {
        &self.slots[key]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temperature() -> LinguisticVariable {
        LinguisticVariable::new("temperature", 0. ..=100.)
            .and_then(|v| v.with_term("low", MembershipFunction::triangular(0., 0., 50.)?))
            .and_then(|v| v.with_term("med", MembershipFunction::triangular(0., 50., 100.)?))
            .and_then(|v| v.with_term("high", MembershipFunction::triangular(50., 100., 100.)?))
            .unwrap()
    }

    #[test]
    fn test_fuzzify() {
        let var = temperature();

        assert_eq!(var.fuzzify(25.), vec![("low", 0.5), ("med", 0.5), ("high", 0.)]);
        assert_eq!(var.fuzzify(100.), vec![("low", 0.), ("med", 0.), ("high", 1.)]);
    }

    #[test]
    fn test_duplicate_term() {
        let mut var = temperature();
        let err = var
            .add_term("low", MembershipFunction::gaussian(0., 5.).unwrap())
            .unwrap_err();

        assert_eq!(
            err,
            FisError::DuplicateTerm {
                variable: "temperature".into(),
                term: "low".into()
            }
        );
        assert_eq!(var.terms().len(), 3);
    }

    #[test]
    fn test_replace_term() {
        let mut var = temperature();

        var.replace_term("low", MembershipFunction::trapezoidal(0., 0., 20., 40.).unwrap())
            .unwrap();

        assert_eq!(var.fuzzify(20.)[0], ("low", 1.));
        assert!(matches!(
            var.replace_term("freezing", MembershipFunction::singleton(0.).unwrap()),
            Err(FisError::ReferentialIntegrity { .. })
        ));
    }

    #[test]
    fn test_degenerate_domain() {
        assert!(matches!(
            LinguisticVariable::new("flat", 1. ..=1.),
            Err(FisError::InvalidParameter { .. })
        ));
        assert!(Domain::new(2., 1.).is_err());
        assert!(Domain::new(0., f64::INFINITY).is_err());
    }

    #[test]
    fn test_domain_deserialize_is_checked() {
        let domain: Domain = serde_json::from_str("[0.0, 10.0]").unwrap();

        assert_eq!(domain.midpoint(), 5.);
        assert!(serde_json::from_str::<Domain>("[3.0, 3.0]").is_err());
    }

    #[test]
    fn test_variables_reject_duplicate_names() {
        let mut vars = Variables::new();

        vars.insert(temperature()).unwrap();

        assert_eq!(
            vars.insert(temperature()),
            Err(FisError::DuplicateVariable("temperature".into()))
        );
        assert_eq!(vars.get("temperature").map(|v| v.terms().len()), Some(3));
    }
}
