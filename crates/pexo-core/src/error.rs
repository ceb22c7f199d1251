use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No account found with this email")]
    NotFound,

    #[error("Invalid password")]
    InvalidCredential,

    #[error("Email already exists")]
    EmailTaken,

    #[error("Persisted record '{key}' is not valid JSON")]
    MalformedState { key: String },

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}
