use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ops::{AndOp, OrOp};

/// `variable is term`
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Proposition {
    pub variable: String,
    pub term: String,
}

impl Proposition {
    pub fn new(variable: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            term: term.into(),
        }
    }
}

impl fmt::Display for Proposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is {}", self.variable, self.term)
    }
}

/// A rule premise. Authored over [`Proposition`]s and resolved to variable
/// keys and term indices when the rule base is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr<P = Proposition> {
    Is(P),
    And(Vec<Expr<P>>),
    Or(Vec<Expr<P>>),
}

/// Starts a premise: `is("speed", "fast").and(is("load", "high"))`.
pub fn is(variable: impl Into<String>, term: impl Into<String>) -> Expr {
    Expr::Is(Proposition::new(variable, term))
}

impl<P> Expr<P> {
    pub fn and(self, rhs: Expr<P>) -> Self {
        match self {
            Expr::And(mut exprs) => {
                exprs.push(rhs);
                Expr::And(exprs)
            },
            lhs => Expr::And(vec![lhs, rhs]),
        }
    }

    pub fn or(self, rhs: Expr<P>) -> Self {
        match self {
            Expr::Or(mut exprs) => {
                exprs.push(rhs);
                Expr::Or(exprs)
            },
            lhs => Expr::Or(vec![lhs, rhs]),
        }
    }

    /// Leaf propositions in authoring order.
    pub fn propositions(&self) -> Vec<&P> {
        let mut props = Vec::new();

        fn parse<'p, P>(expr: &'p Expr<P>, out: &mut Vec<&'p P>) {
            match expr {
                Expr::Is(prop) => out.push(prop),
                Expr::And(exprs) | Expr::Or(exprs) => {
                    for expr in exprs {
                        parse(expr, out);
                    }
                },
            }
        }

        parse(self, &mut props);

        props
    }

    pub(crate) fn try_map<Q, E>(&self, f: &mut impl FnMut(&P) -> Result<Q, E>) -> Result<Expr<Q>, E> {
        Ok(match self {
            Expr::Is(prop) => Expr::Is(f(prop)?),
            Expr::And(exprs) => Expr::And(exprs.iter().map(|e| e.try_map(f)).collect::<Result<_, _>>()?),
            Expr::Or(exprs) => Expr::Or(exprs.iter().map(|e| e.try_map(f)).collect::<Result<_, _>>()?),
        })
    }

    /// Truth degree of the premise given a degree for every proposition.
    pub(crate) fn eval(&self, degree: &impl Fn(&P) -> f64, and_op: AndOp, or_op: OrOp) -> f64 {
        match self {
            Expr::Is(prop) => degree(prop),
            Expr::And(exprs) => and_op.fold(exprs.iter().map(|e| e.eval(degree, and_op, or_op))),
            Expr::Or(exprs) => or_op.fold(exprs.iter().map(|e| e.eval(degree, and_op, or_op))),
        }
    }
}

impl<P: fmt::Display> fmt::Display for Expr<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (exprs, sep) = match self {
            Expr::Is(prop) => return write!(f, "{prop}"),
            Expr::And(exprs) => (exprs, " AND "),
            Expr::Or(exprs) => (exprs, " OR "),
        };

        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                f.write_str(sep)?;
            }
            match expr {
                Expr::Is(_) => write!(f, "{expr}")?,
                _ => write!(f, "({expr})")?,
            }
        }

        Ok(())
    }
}

#[test]
fn test_builder_flattens_chains() {
    let premise = is("score", "high").and(is("ratio", "good")).and(is("credit", "good"));

    assert!(matches!(&premise, Expr::And(exprs) if exprs.len() == 3));
    assert_eq!(
        premise.to_string(),
        "score is high AND ratio is good AND credit is good"
    );
}

#[test]
fn test_nested_premise() {
    let premise = is("score", "low").and(is("ratio", "bad")).or(is("credit", "bad"));
    let props: Vec<_> = premise.propositions().into_iter().map(|p| p.term.as_str()).collect();

    assert_eq!(props, ["low", "bad", "bad"]);
    assert_eq!(
        premise.to_string(),
        "(score is low AND ratio is bad) OR credit is bad"
    );
}

#[test]
fn test_eval() {
    let premise = is("a", "x").and(is("b", "y")).or(is("c", "z"));
    let degree = |p: &Proposition| match p.variable.as_str() {
        "a" => 0.8,
        "b" => 0.3,
        _ => 0.1,
    };

    assert_eq!(premise.eval(&degree, AndOp::Min, OrOp::Max), 0.3);
    assert!((premise.eval(&degree, AndOp::Prod, OrOp::Max) - 0.24).abs() < 1e-12);
}
