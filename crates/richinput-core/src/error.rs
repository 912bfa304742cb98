//! Error types for input controls.

use miette::Diagnostic;
use smol_str::SmolStr;

use crate::platform::DomPart;

/// Errors surfaced by input controls and their collaborators.
///
/// Lifecycle races (dispose or reload while the editor is loading, a second
/// dialog requested while one is open) are never reported through this type;
/// they are resolved by deferring, coalescing or rejecting the request.
#[derive(thiserror::Error, Debug, Diagnostic, Clone, PartialEq)]
#[non_exhaustive]
pub enum InputError {
    /// Configuration passed to design mode failed validation.
    #[error("invalid editor configuration: {field}: {reason}")]
    #[diagnostic(
        code(richinput::config),
        help("check the option against the documented configuration surface")
    )]
    InvalidConfig { field: SmolStr, reason: SmolStr },

    /// Configuration could not be deserialized.
    #[error("malformed editor configuration: {0}")]
    #[diagnostic(code(richinput::config::parse))]
    MalformedConfig(String),

    /// A DOM element the control relies on was not produced by the engine.
    #[error("editor DOM element missing after ready notification: {0:?}")]
    #[diagnostic(
        code(richinput::integrity),
        help("the editor engine changed its DOM structure incompatibly")
    )]
    MissingEditorElement(DomPart),

    /// Operation invoked on a control that has been disposed.
    #[error("control has been disposed")]
    #[diagnostic(code(richinput::disposed))]
    Disposed,

    /// Tag lookup request failed.
    #[error("unable to get tags - request failed with HTTP status code {status}")]
    #[diagnostic(code(richinput::tags::request))]
    TagRequestFailed { status: u16 },

    /// Tag lookup request did not complete in time.
    #[error("unable to get tags - request did not return data in time")]
    #[diagnostic(code(richinput::tags::timeout))]
    TagRequestTimedOut,

    /// A collaborator invoked a callback in a way the control does not support.
    #[error("unexpected callback from collaborator: {0}")]
    #[diagnostic(code(richinput::callback))]
    UnexpectedCallback(SmolStr),
}

impl InputError {
    pub(crate) fn invalid_config(field: impl Into<SmolStr>, reason: impl Into<SmolStr>) -> Self {
        InputError::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error signals a broken collaborator rather than misuse.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            InputError::MissingEditorElement(_) | InputError::UnexpectedCallback(_)
        )
    }
}

impl From<serde_json::Error> for InputError {
    fn from(e: serde_json::Error) -> Self {
        InputError::MalformedConfig(e.to_string())
    }
}
