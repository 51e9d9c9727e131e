use crate::selector::SelectorError;
use delegation_core::DelegationError;

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum DomError {
    #[error("selector: {0}")]
    Selector(#[from] SelectorError),

    #[error("delegation: {0}")]
    Delegation(#[from] DelegationError),

    #[error("not an element: {operation}")]
    NotAnElement { operation: &'static str },

    #[error("hierarchy request: {reason}")]
    HierarchyRequest { reason: &'static str },

    #[error(transparent)]
    Controller(#[from] anyhow::Error),
}

pub type DomResult<T> = Result<T, DomError>;
