use thiserror::Error;

/// Every error the core can raise.
///
/// `ContractViolation` and `CapacityExceeded` are propagated verbatim to the
/// caller; `Io`/`MonaFormat` are raised by [`crate::mona`] only;
/// `NotImplemented` is raised by [`crate::legacy`] only.
#[derive(Debug, Error)]
pub enum Error {
    #[error("contract violation: {message}")]
    ContractViolation { message: String },

    #[error("capacity exceeded: {n_bits} state bits cannot hold {requested_states} states")]
    CapacityExceeded {
        n_bits: u32,
        requested_states: usize,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed MONA file: {message}")]
    MonaFormat { message: String },

    #[error("{strategy} does not support {construct}")]
    NotImplemented {
        strategy: &'static str,
        construct: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn contract(message: impl Into<String>) -> Error {
    Error::ContractViolation {
        message: message.into(),
    }
}
