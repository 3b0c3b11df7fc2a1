//! The HTTP client every typed service is built on.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::header::HeaderValue;
use reqwest::{Client, Method, Response, StatusCode, Url, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::RestError;

/// Matches the `rel="last"` entry of a `link` continuation header and
/// captures its page number.
static LAST_PAGE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"page=(\d+)>; rel="last""#).unwrap());

/// Token-authorized JSON client rooted at one base URL.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Build a client rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Url`] when `base_url` does not parse.
    pub fn new(base_url: &str) -> Result<Self, RestError> {
        let mut base = Url::parse(base_url).map_err(|err| RestError::Url {
            detail: err.to_string(),
        })?;
        // Paths joined onto the base are relative, so the base must end in
        // a slash or its last segment would be replaced.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base,
            token: None,
        })
    }

    /// Attach a bearer token to every request, builder style.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// `GET path`, decoding the response body as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Status`] outside the 2xx range, with the body
    /// text preserved.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RestError> {
        let response = self.request(Method::GET, path)?.send().await?;
        Ok(Self::accept(response).await?.json().await?)
    }

    /// `POST path` with a JSON body, decoding the response body as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Status`] outside the 2xx range.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, RestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.request(Method::POST, path)?.json(body).send().await?;
        Ok(Self::accept(response).await?.json().await?)
    }

    /// `PUT path` with a JSON body, decoding the response body as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Status`] outside the 2xx range.
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, RestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.request(Method::PUT, path)?.json(body).send().await?;
        Ok(Self::accept(response).await?.json().await?)
    }

    /// `PATCH path` with a JSON body, decoding the response body as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Status`] outside the 2xx range.
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, RestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.request(Method::PATCH, path)?.json(body).send().await?;
        Ok(Self::accept(response).await?.json().await?)
    }

    /// `DELETE path`. True iff the server answered 204 No Content.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Status`] outside the 2xx range.
    pub async fn delete(&self, path: &str) -> Result<bool, RestError> {
        let response = self.request(Method::DELETE, path)?.send().await?;
        if response.status().is_success() {
            Ok(response.status() == StatusCode::NO_CONTENT)
        } else {
            Err(Self::reject(response).await)
        }
    }

    /// `GET path` across its continuation pages, accumulating elements until
    /// the last page or `max_results`, whichever comes first.
    ///
    /// Page count comes from the response `link` header's `rel="last"`
    /// entry. An absent header means a single page; a present but
    /// unusable one is an error rather than a silent truncation.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Pagination`] for an unusable `link` header, or
    /// [`RestError::Status`] when any page request is rejected.
    pub async fn get_paged<T: DeserializeOwned>(
        &self,
        path: &str,
        max_results: usize,
    ) -> Result<Vec<T>, RestError> {
        let mut results = Vec::new();
        let mut page: u32 = 0;
        let mut last_page: u32 = 0;

        while page <= last_page && results.len() < max_results {
            let mut url = self.endpoint(path)?;
            if page > 0 {
                let _ = url
                    .query_pairs_mut()
                    .append_pair("page", &page.to_string());
            }
            let response = self.builder(Method::GET, url).send().await?;
            let response = Self::accept(response).await?;
            if let Some(value) = response.headers().get(header::LINK) {
                last_page = Self::last_page_number(value)?;
            }
            let batch: Vec<T> = response.json().await?;
            results.extend(batch);
            page += 1;
        }

        debug!(path, pages = page, results = results.len(), "paged fetch done");
        Ok(results)
    }

    fn endpoint(&self, path: &str) -> Result<Url, RestError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|err| RestError::Url {
                detail: err.to_string(),
            })
    }

    fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder, RestError> {
        let url = self.endpoint(path)?;
        Ok(self.builder(method, url))
    }

    fn builder(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        debug!(%method, %url, "rest request");
        let mut builder = self.http.request(method, url);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn accept(response: Response) -> Result<Response, RestError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::reject(response).await)
        }
    }

    async fn reject(response: Response) -> RestError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        warn!(status, "rest request rejected");
        RestError::Status { status, body }
    }

    fn last_page_number(value: &HeaderValue) -> Result<u32, RestError> {
        let text = value.to_str().map_err(|_| RestError::Pagination {
            detail: "header value is not visible ASCII".to_owned(),
        })?;
        let captures = LAST_PAGE_LINK
            .captures(text)
            .ok_or_else(|| RestError::Pagination {
                detail: format!("no `rel=\"last\"` page in `{text}`"),
            })?;
        captures[1].parse().map_err(|_| RestError::Pagination {
            detail: format!("page number out of range in `{text}`"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn last_page(text: &str) -> Result<u32, RestError> {
        ApiClient::last_page_number(&HeaderValue::from_str(text).unwrap())
    }

    #[test]
    fn link_header_yields_the_last_page() {
        let header = "<https://example.com/api/v1/chats/1/users?page=0>; rel=\"first\", \
                      <https://example.com/api/v1/chats/1/users?page=3>; rel=\"last\"";
        assert_eq!(last_page(header).unwrap(), 3);
    }

    #[test]
    fn link_header_without_a_last_entry_is_rejected() {
        let header = "<https://example.com/api/v1/chats/1/users?page=1>; rel=\"next\"";
        assert!(matches!(
            last_page(header),
            Err(RestError::Pagination { .. })
        ));
    }

    #[test]
    fn oversized_page_numbers_are_rejected() {
        let header = "<https://example.com/x?page=99999999999>; rel=\"last\"";
        assert!(matches!(
            last_page(header),
            Err(RestError::Pagination { .. })
        ));
    }

    #[test]
    fn base_urls_gain_a_trailing_slash() {
        let client = ApiClient::new("https://example.com/api/v1").unwrap();
        let url = client.endpoint("channels/42").unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/v1/channels/42");
    }

    #[test]
    fn absolute_paths_stay_under_the_base() {
        let client = ApiClient::new("https://example.com/api/v1/").unwrap();
        let url = client.endpoint("/channels/42").unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/v1/channels/42");
    }
}
