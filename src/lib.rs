//! Mamdani fuzzy inference with finite-difference sensitivities.
//!
//! A [`RuleBase`] ties input and output [`LinguisticVariable`]s to a list of
//! [`Rule`]s and is checked once when built. An [`InferenceEngine`] evaluates
//! it against crisp inputs: fuzzification, firing strengths, implication,
//! aggregation and defuzzification over a fixed grid. The [`SensitivityEngine`]
//! differentiates any [`Model`] by central differences.
//!
//! ```
//! use fuzzy_me::{is, EngineConfig, InferenceEngine, Inputs, LinguisticVariable, MembershipFunction, Rule, RuleBase};
//!
//! let speed = LinguisticVariable::new("speed", 0. ..=10.)?
//!     .with_term("slow", MembershipFunction::triangular(0., 0., 5.)?)?
//!     .with_term("fast", MembershipFunction::triangular(5., 10., 10.)?)?;
//! let effort = LinguisticVariable::new("effort", 0. ..=1.)?
//!     .with_term("low", MembershipFunction::triangular(0., 0., 0.5)?)?
//!     .with_term("high", MembershipFunction::triangular(0.5, 1., 1.)?)?;
//! let rules = [
//!     Rule::new(is("speed", "slow"), is("effort", "low")),
//!     Rule::new(is("speed", "fast"), is("effort", "high")),
//! ];
//!
//! let engine = InferenceEngine::new(RuleBase::build([speed], [effort], rules)?, EngineConfig::default())?;
//! let outputs = engine.evaluate(&Inputs::new().with("speed", 9.))?;
//!
//! assert!(outputs.get("effort").is_some_and(|effort| effort > 0.5));
//! # Ok::<(), fuzzy_me::FisError>(())
//! ```

mod cascade;
mod dsl;
mod error;
mod inference;
mod inputs;
mod linspace;
mod math;
mod membership;
mod ops;
mod outputs;
mod rule_base;
mod rules;
mod sensitivity;
mod surface;
mod terms;
mod variable;

pub use cascade::{Cascade, Explanation};
pub use dsl::{is, Expr, Proposition};
pub use error::{FisError, Result};
pub use inference::{DomainPolicy, EngineConfig, InferenceEngine};
pub use inputs::Inputs;
pub use linspace::Linspace;
pub use membership::MembershipFunction;
pub use ops::{AggregationOp, AndOp, DefuzzificationOp, ImplicationOp, OrOp};
pub use outputs::{Evaluation, Inference, Outputs, Profile};
pub use rule_base::{ModelDefinition, RuleBase};
pub use rules::{Rule, Rules};
pub use sensitivity::{Gradient, Model, SensitivityEngine, StepSizes};
pub use surface::{Axis, ResponseSurface};
pub use terms::{Term, Terms};
pub use variable::{Domain, LinguisticVariable};
