use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CardexError {
    #[error("script '{name}' is not registered")]
    ScriptNotRegistered { name: String },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(
        "identifier or its components (release number, catalog number, variant code, frame code) must be provided"
    )]
    MissingIdentifierComponents,
    #[error("encode error: {0}")]
    Encode(String),
}

impl CardexError {
    pub fn code_str(&self) -> &'static str {
        match self {
            CardexError::ScriptNotRegistered { .. } => "script_not_registered",
            CardexError::Store(err) => err.code_str(),
            CardexError::MissingIdentifierComponents => "missing_identifier_components",
            CardexError::Encode(_) => "encode",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CardexError;
    use crate::store::StoreError;

    #[test]
    fn error_code_strings_are_stable() {
        let err = CardexError::ScriptNotRegistered {
            name: "get_card".into(),
        };
        assert_eq!(err.code_str(), "script_not_registered");
        assert_eq!(
            CardexError::MissingIdentifierComponents.code_str(),
            "missing_identifier_components"
        );
        assert_eq!(
            CardexError::Store(StoreError::UnknownScript).code_str(),
            "unknown_script"
        );
    }
}
