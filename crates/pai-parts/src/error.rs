use thiserror::Error;

#[derive(Error, Debug)]
pub enum PartsError {
    #[error("catalog client credentials are not configured")]
    MissingCredentials,

    #[error("failed to obtain catalog token: {0}")]
    Token(String),

    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog query failed: {0}")]
    GraphQl(String),

    #[error("no catalog result for {0}")]
    NotFound(String),

    #[error("malformed catalog response: {0}")]
    Malformed(String),
}
