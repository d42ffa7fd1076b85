use thiserror::Error;

use crate::component::Hook;
use crate::host::HostError;
use crate::lifecycle::LifecycleState;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure of a single instance's lifecycle step.
///
/// None of these are retried. Once returned from [`Instance::activate`](crate::Instance::activate)
/// the instance sits in [`LifecycleState::Failed`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("`{hook}` hook failed")]
    Hook {
        hook: Hook,
        #[source]
        source: anyhow::Error,
    },

    #[error("render failed")]
    Render(#[source] anyhow::Error),

    #[error("boundary construction requested twice (instance is {state:?})")]
    AlreadyActivated { state: LifecycleState },

    #[error(transparent)]
    Host(#[from] HostError),
}

impl Error {
    pub(crate) fn hook(hook: Hook, source: anyhow::Error) -> Self {
        Error::Hook { hook, source }
    }

    /// The hook that failed, if the failure came from author code.
    pub fn failed_hook(&self) -> Option<Hook> {
        match self {
            Error::Hook { hook, .. } => Some(*hook),
            Error::Render(_) => Some(Hook::Render),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("`{0}` is not a valid custom element name")]
    InvalidTag(String),
    #[error("`{0}` has already been defined")]
    AlreadyDefined(String),
    #[error("no component is defined for `{0}`")]
    Undefined(String),
}
