use thiserror::Error;

/// Errors raised while authoring or evaluating a fuzzy inference system.
///
/// Authoring errors (`InvalidParameter`, `DuplicateTerm`, `DuplicateVariable`,
/// `ReferentialIntegrity`) abort the construction that raised them. Everything
/// else is per evaluation and leaves the model untouched.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum FisError {
    #[error("invalid parameter for {context}: {reason}")]
    InvalidParameter { context: String, reason: String },

    #[error("term `{term}` is already defined for variable `{variable}`")]
    DuplicateTerm { variable: String, term: String },

    #[error("variable `{0}` is defined more than once")]
    DuplicateVariable(String),

    #[error("{owner} references {reference}, which does not exist")]
    ReferentialIntegrity { owner: String, reference: String },

    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    #[error("no value supplied for input `{0}`")]
    MissingInput(String),

    #[error("input `{variable}` is not a finite number ({value})")]
    NonFiniteInput { variable: String, value: f64 },

    #[error("input `{variable}` = {value} lies outside its domain [{min}, {max}]")]
    InputOutOfDomain {
        variable: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("no rule fired for output `{0}`")]
    NoRuleFired(String),
}

pub type Result<T, E = FisError> = std::result::Result<T, E>;

impl FisError {
    pub(crate) fn invalid(context: impl Into<String>, reason: impl Into<String>) -> Self {
        FisError::InvalidParameter {
            context: context.into(),
            reason: reason.into(),
        }
    }
}
