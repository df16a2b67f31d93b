//! Typed errors for config loading and CRUD flows.

use thiserror::Error;

/// Fallback shown when neither the server nor the transport supplied a message.
pub const UNKNOWN_ERROR: &str = "Error desconocido";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("duplicate field '{field}' in schema for model '{model}'")]
    DuplicateField { model: String, field: String },
    #[error("field '{field}' declares a label field but is not a reference")]
    LabelOnNonReference { field: String },
    #[error("unknown model: {0}")]
    UnknownModel(String),
    #[error("config load: {0}")]
    Load(String),
    #[error("config parse: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CrudError {
    /// Input rejected, either by a local rule (`status` is `None`) or by the server.
    #[error("{message}")]
    Validation {
        status: Option<u16>,
        message: String,
    },
    /// Network failure or a response the client cannot interpret.
    #[error("{0}")]
    Transport(String),
    /// A submission is already in flight for this dialog.
    #[error("a submission is already in flight")]
    StateConflict,
}

impl CrudError {
    pub fn local_validation(message: impl Into<String>) -> Self {
        CrudError::Validation {
            status: None,
            message: message.into(),
        }
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        CrudError::Validation {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            CrudError::Transport(UNKNOWN_ERROR.to_string())
        } else {
            CrudError::Transport(message)
        }
    }

    /// Message suitable for showing to the user verbatim.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_falls_back_to_unknown_error() {
        assert_eq!(CrudError::transport("  ").user_message(), UNKNOWN_ERROR);
        assert_eq!(CrudError::transport("timeout").user_message(), "timeout");
    }

    #[test]
    fn validation_displays_server_message_verbatim() {
        let err = CrudError::rejected(400, "nombre: requerido");
        assert_eq!(err.to_string(), "nombre: requerido");
    }
}
