use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Request error: {0}")]
    Request(String),

    #[error("Non-JSON response: {0}")]
    NonJsonResponse(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for AnalyzerError {
    fn from(err: serde_json::Error) -> Self {
        AnalyzerError::Parse(err.to_string())
    }
}
