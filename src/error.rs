use thiserror::Error;

/// Failure of a single catalog call.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("catalog returned {status} for {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    #[error("catalog payload could not be parsed: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("query must be {min} to {max} characters after trimming")]
    InvalidQuery { min: usize, max: usize },

    #[error("search unavailable: all {attempts} catalog calls failed, last error: {last}")]
    Unavailable {
        attempts: usize,
        #[source]
        last: CatalogError,
    },
}
