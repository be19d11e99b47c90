use serde::{Deserialize, Serialize};

use crate::membership::MembershipFunction;

/// A linguistic term: a label such as "low" and its membership curve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub label: String,
    pub function: MembershipFunction,
}

/// Terms of one variable in authoring order. Labels are kept unique by
/// [`LinguisticVariable`](crate::LinguisticVariable).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Terms(pub(crate) Vec<Term>);

impl Terms {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.0.iter().position(|term| term.label == label)
    }

    pub fn get(&self, label: &str) -> Option<&MembershipFunction> {
        self.0.iter().find(|term| term.label == label).map(|term| &term.function)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MembershipFunction)> {
        self.0.iter().map(|term| (term.label.as_str(), &term.function))
    }

    pub(crate) fn push(&mut self, label: String, function: MembershipFunction) {
        self.0.push(Term { label, function });
    }

    pub(crate) fn replace(&mut self, index: usize, function: MembershipFunction) {
        self.0[index].function = function;
    }

    /// First label that occurs more than once, if any.
    pub(crate) fn duplicate_label(&self) -> Option<&str> {
        self.0
            .iter()
            .enumerate()
            .find(|(i, term)| self.0[..*i].iter().any(|prev| prev.label == term.label))
            .map(|(_, term)| term.label.as_str())
    }
}
