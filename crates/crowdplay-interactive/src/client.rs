//! Typed operations over an attached session.

use chrono::{DateTime, Utc};
use crowdplay_session::Session;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::InteractiveError;
use crate::methods;
use crate::models::{
    Control, ControlList, Group, GroupList, MemoryStats, Participant, ParticipantPage, Scene,
    SceneList, ServerClock, ThrottleConfig, ThrottleState,
};

/// Typed client for the interactive control protocol.
///
/// Cheap to clone; clones share the underlying [`Session`].
#[derive(Debug, Clone)]
pub struct InteractiveClient {
    session: Session,
}

impl InteractiveClient {
    /// Wrap an attached session.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// The underlying session, for subscriptions and raw calls.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Announce whether the integration is ready for participants.
    ///
    /// Sent fire-and-forget: the service acknowledges with an `onReady` push
    /// rather than a reply.
    ///
    /// # Errors
    ///
    /// Fails only when the session can no longer send.
    pub async fn ready(&self, is_ready: bool) -> Result<(), InteractiveError> {
        Ok(self
            .session
            .fire(methods::READY, json!({"isReady": is_ready}))
            .await?)
    }

    /// Fetch the server wall clock.
    ///
    /// # Errors
    ///
    /// Fails when the call fails or the reply is not an epoch-ms timestamp.
    pub async fn server_time(&self) -> Result<DateTime<Utc>, InteractiveError> {
        let clock: ServerClock = self.session.call(methods::GET_TIME, json!({})).await?;
        Ok(clock.time)
    }

    /// Fetch the current memory usage report.
    ///
    /// # Errors
    ///
    /// Fails when the call fails.
    pub async fn memory_stats(&self) -> Result<MemoryStats, InteractiveError> {
        Ok(self
            .session
            .call(methods::GET_MEMORY_STATS, json!({}))
            .await?)
    }

    /// Install per-method bandwidth limits.
    ///
    /// # Errors
    ///
    /// Fails when the call fails.
    pub async fn set_bandwidth_throttle(
        &self,
        throttle: &ThrottleConfig,
    ) -> Result<(), InteractiveError> {
        let params = serde_json::to_value(throttle).unwrap_or(Value::Null);
        self.ack(methods::SET_BANDWIDTH_THROTTLE, params).await
    }

    /// Fetch per-method throttle counters.
    ///
    /// # Errors
    ///
    /// Fails when the call fails.
    pub async fn throttle_state(&self) -> Result<ThrottleState, InteractiveError> {
        Ok(self
            .session
            .call(methods::GET_THROTTLE_STATE, json!({}))
            .await?)
    }

    /// Fetch the participant roster from the top.
    ///
    /// The returned page reports `total` and `has_more` so callers can tell
    /// whether a larger roster exists.
    ///
    /// # Errors
    ///
    /// Fails when the call fails.
    pub async fn all_participants(&self) -> Result<ParticipantPage, InteractiveError> {
        Ok(self
            .session
            .call(methods::GET_ALL_PARTICIPANTS, json!({"from": 0}))
            .await?)
    }

    /// Fetch participants who gave input after `since`.
    ///
    /// # Errors
    ///
    /// Fails when the call fails.
    pub async fn active_participants(
        &self,
        since: DateTime<Utc>,
    ) -> Result<ParticipantPage, InteractiveError> {
        Ok(self
            .session
            .call(
                methods::GET_ACTIVE_PARTICIPANTS,
                json!({"threshold": since.timestamp_millis()}),
            )
            .await?)
    }

    /// Rewrite attributes of connected participants.
    ///
    /// # Errors
    ///
    /// Fails when the call fails.
    pub async fn update_participants(
        &self,
        participants: &[Participant],
    ) -> Result<ParticipantPage, InteractiveError> {
        Ok(self
            .session
            .call(
                methods::UPDATE_PARTICIPANTS,
                json!({"participants": participants}),
            )
            .await?)
    }

    /// Create participant groups.
    ///
    /// # Errors
    ///
    /// Fails when the call fails.
    pub async fn create_groups(&self, groups: &[Group]) -> Result<(), InteractiveError> {
        self.ack(methods::CREATE_GROUPS, json!({"groups": groups}))
            .await
    }

    /// Fetch every group.
    ///
    /// # Errors
    ///
    /// Fails when the call fails.
    pub async fn groups(&self) -> Result<Vec<Group>, InteractiveError> {
        let list: GroupList = self.session.call(methods::GET_GROUPS, json!({})).await?;
        Ok(list.groups)
    }

    /// Rewrite existing groups, returning their new state.
    ///
    /// # Errors
    ///
    /// Fails when the call fails.
    pub async fn update_groups(&self, groups: &[Group]) -> Result<Vec<Group>, InteractiveError> {
        let list: GroupList = self
            .session
            .call(methods::UPDATE_GROUPS, json!({"groups": groups}))
            .await?;
        Ok(list.groups)
    }

    /// Delete `group_id`, moving its participants into `reassign_group_id`.
    ///
    /// Two dependent steps: fetch the groups to confirm the replacement
    /// exists, then delete. A failed first step stops the sequence; nothing
    /// is rolled back.
    ///
    /// # Errors
    ///
    /// Returns [`InteractiveError::GroupNotFound`] when the replacement group
    /// does not exist, or the underlying call error.
    pub async fn delete_group(
        &self,
        group_id: &str,
        reassign_group_id: &str,
    ) -> Result<(), InteractiveError> {
        let groups = self.groups().await?;
        if !groups.iter().any(|group| group.group_id == reassign_group_id) {
            return Err(InteractiveError::GroupNotFound {
                group_id: reassign_group_id.to_owned(),
            });
        }
        debug!(group_id, reassign_group_id, "deleting group");
        self.ack(
            methods::DELETE_GROUP,
            json!({"groupID": group_id, "reassignGroupID": reassign_group_id}),
        )
        .await
    }

    /// Create scenes, returning them as the service recorded them.
    ///
    /// # Errors
    ///
    /// Fails when the call fails.
    pub async fn create_scenes(&self, scenes: &[Scene]) -> Result<Vec<Scene>, InteractiveError> {
        let list: SceneList = self
            .session
            .call(methods::CREATE_SCENES, json!({"scenes": scenes}))
            .await?;
        Ok(list.scenes)
    }

    /// Fetch every scene.
    ///
    /// # Errors
    ///
    /// Fails when the call fails.
    pub async fn scenes(&self) -> Result<Vec<Scene>, InteractiveError> {
        let list: SceneList = self.session.call(methods::GET_SCENES, json!({})).await?;
        Ok(list.scenes)
    }

    /// Rewrite existing scenes, returning their new state.
    ///
    /// # Errors
    ///
    /// Fails when the call fails.
    pub async fn update_scenes(&self, scenes: &[Scene]) -> Result<Vec<Scene>, InteractiveError> {
        let list: SceneList = self
            .session
            .call(methods::UPDATE_SCENES, json!({"scenes": scenes}))
            .await?;
        Ok(list.scenes)
    }

    /// Delete `scene_id`, moving its groups onto `reassign_scene_id`.
    ///
    /// Two dependent steps: fetch the scenes to confirm the replacement
    /// exists, then delete. A failed first step stops the sequence; nothing
    /// is rolled back.
    ///
    /// # Errors
    ///
    /// Returns [`InteractiveError::SceneNotFound`] when the replacement scene
    /// does not exist, or the underlying call error.
    pub async fn delete_scene(
        &self,
        scene_id: &str,
        reassign_scene_id: &str,
    ) -> Result<(), InteractiveError> {
        let scenes = self.scenes().await?;
        if !scenes.iter().any(|scene| scene.scene_id == reassign_scene_id) {
            return Err(InteractiveError::SceneNotFound {
                scene_id: reassign_scene_id.to_owned(),
            });
        }
        debug!(scene_id, reassign_scene_id, "deleting scene");
        self.ack(
            methods::DELETE_SCENE,
            json!({"sceneID": scene_id, "reassignSceneID": reassign_scene_id}),
        )
        .await
    }

    /// Add controls to a scene.
    ///
    /// # Errors
    ///
    /// Fails when the call fails.
    pub async fn create_controls(
        &self,
        scene_id: &str,
        controls: &[Control],
    ) -> Result<(), InteractiveError> {
        self.ack(
            methods::CREATE_CONTROLS,
            json!({"sceneID": scene_id, "controls": controls}),
        )
        .await
    }

    /// Rewrite controls on a scene, returning their new state.
    ///
    /// # Errors
    ///
    /// Fails when the call fails.
    pub async fn update_controls(
        &self,
        scene_id: &str,
        controls: &[Control],
    ) -> Result<Vec<Control>, InteractiveError> {
        let list: ControlList = self
            .session
            .call(
                methods::UPDATE_CONTROLS,
                json!({"sceneID": scene_id, "controls": controls}),
            )
            .await?;
        Ok(list.controls)
    }

    /// Remove controls from a scene by id.
    ///
    /// # Errors
    ///
    /// Fails when the call fails.
    pub async fn delete_controls(
        &self,
        scene_id: &str,
        control_ids: &[&str],
    ) -> Result<(), InteractiveError> {
        self.ack(
            methods::DELETE_CONTROLS,
            json!({"sceneID": scene_id, "controlIDs": control_ids}),
        )
        .await
    }

    /// Capture the spark transaction attached to an input.
    ///
    /// # Errors
    ///
    /// Fails when the call fails, including when the transaction has already
    /// expired on the service side.
    pub async fn capture_transaction(&self, transaction_id: &str) -> Result<(), InteractiveError> {
        self.ack(methods::CAPTURE, json!({"transactionID": transaction_id}))
            .await
    }

    /// Call an operation whose reply body carries nothing we keep.
    async fn ack(&self, method: &str, params: Value) -> Result<(), InteractiveError> {
        let _ = self.session.call_value(method, params).await?;
        Ok(())
    }
}
