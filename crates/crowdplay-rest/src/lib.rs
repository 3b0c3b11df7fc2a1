//! Token-authorized JSON client for the platform REST API.
//!
//! [`ApiClient`] carries the base URL, bearer token, and connection pool;
//! typed services like [`ChannelsService`] layer endpoint knowledge on top.
//! List endpoints paginate through the response `link` header, which
//! [`ApiClient::get_paged`] follows automatically.

mod channels;
mod client;
mod error;

pub use channels::{Channel, ChannelsService, ChatConnection, ChatUser};
pub use client::ApiClient;
pub use error::RestError;
