use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Field name must not be empty")]
    EmptyFieldName,

    #[error("Field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("Schema must declare at least one required field")]
    NoRequiredField,
}
