//! Channel endpoints, the thinnest slice of the REST surface.

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::RestError;

/// A broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    /// Channel identifier.
    pub id: u64,
    /// Owning user.
    #[serde(default)]
    pub user_id: u64,
    /// URL-safe channel name.
    pub token: String,
    /// Whether the channel is live right now.
    #[serde(default)]
    pub online: bool,
    /// Stream title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Concurrent viewers right now.
    #[serde(default)]
    pub viewers_current: u64,
    /// Follower count.
    #[serde(default)]
    pub num_followers: u64,
}

/// Connection details for a channel's chat server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatConnection {
    /// WebSocket endpoints to try, in order.
    #[serde(default)]
    pub endpoints: Vec<String>,
    /// Short-lived key authorizing the join. Absent for anonymous reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authkey: Option<String>,
    /// Permissions granted to the joining user.
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// A user present in a channel's chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatUser {
    /// Stable account identifier.
    pub user_id: u64,
    /// Display name.
    pub user_name: String,
    /// Chat roles, `Owner` and `Mod` included.
    #[serde(default)]
    pub user_roles: Vec<String>,
}

/// Typed access to channel endpoints.
#[derive(Debug, Clone)]
pub struct ChannelsService {
    api: ApiClient,
}

impl ChannelsService {
    /// Wrap an API client.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Fetch a channel by id.
    pub async fn channel(&self, channel_id: u64) -> Result<Channel, RestError> {
        self.api.get(&format!("channels/{channel_id}")).await
    }

    /// Fetch the chat connection details for a channel.
    pub async fn chat(&self, channel_id: u64) -> Result<ChatConnection, RestError> {
        self.api.get(&format!("chats/{channel_id}")).await
    }

    /// Fetch users present in a channel's chat, at most `max_results`.
    pub async fn chat_users(
        &self,
        channel_id: u64,
        max_results: usize,
    ) -> Result<Vec<ChatUser>, RestError> {
        self.api
            .get_paged(&format!("chats/{channel_id}/users"), max_results)
            .await
    }
}
