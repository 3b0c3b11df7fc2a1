//! Errors surfaced by the REST client.

/// Failure of a REST request.
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// The request never produced a usable response.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The server answered outside the 2xx range.
    #[error("request rejected with status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, kept verbatim for diagnostics.
        body: String,
    },

    /// A `link` continuation header was present but unusable.
    #[error("undecodable link header: {detail}")]
    Pagination {
        /// What was wrong with the header.
        detail: String,
    },

    /// A base URL or path could not be turned into a request URL.
    #[error("invalid request URL: {detail}")]
    Url {
        /// What was wrong with the URL.
        detail: String,
    },
}
