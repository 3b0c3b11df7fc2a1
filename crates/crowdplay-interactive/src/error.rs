//! Errors surfaced by the interactive client.

use crowdplay_session::SessionError;

/// Failure of an interactive operation.
#[derive(Debug, thiserror::Error)]
pub enum InteractiveError {
    /// The underlying call failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A scene required by a multi-step operation does not exist.
    #[error("scene `{scene_id}` does not exist")]
    SceneNotFound {
        /// The missing scene.
        scene_id: String,
    },

    /// A group required by a multi-step operation does not exist.
    #[error("group `{group_id}` does not exist")]
    GroupNotFound {
        /// The missing group.
        group_id: String,
    },

    /// A push body did not match the shape its method implies.
    #[error("undecodable `{method}` event body")]
    EventDecode {
        /// The push method whose body was rejected.
        method: String,
        /// The underlying decode failure.
        #[source]
        source: serde_json::Error,
    },
}
