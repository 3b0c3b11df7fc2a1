//! Typed views over the pushes a session delivers.

use crowdplay_session::MethodPacket;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::InteractiveError;
use crate::methods;
use crate::models::{Control, Group, InputEvent, MemoryStats, Participant, Scene};

/// A push from the service, decoded into domain terms.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractiveEvent {
    /// Participants joined the session.
    ParticipantsJoined(Vec<Participant>),
    /// Participants left the session.
    ParticipantsLeft(Vec<Participant>),
    /// Participant attributes changed.
    ParticipantsUpdated(Vec<Participant>),
    /// Scenes were created.
    ScenesCreated(Vec<Scene>),
    /// Scenes were rewritten.
    ScenesUpdated(Vec<Scene>),
    /// A scene was deleted.
    SceneDeleted {
        /// The deleted scene.
        scene_id: String,
        /// Where the deleted scene's groups went.
        reassign_scene_id: String,
    },
    /// Groups were created.
    GroupsCreated(Vec<Group>),
    /// Groups were rewritten.
    GroupsUpdated(Vec<Group>),
    /// A group was deleted.
    GroupDeleted {
        /// The deleted group.
        group_id: String,
        /// Where the deleted group's participants went.
        reassign_group_id: String,
    },
    /// Controls were added to a scene.
    ControlsCreated {
        /// The scene that gained controls.
        scene_id: String,
        /// The new controls.
        controls: Vec<Control>,
    },
    /// Controls on a scene were rewritten.
    ControlsUpdated {
        /// The scene whose controls changed.
        scene_id: String,
        /// The controls' new state.
        controls: Vec<Control>,
    },
    /// Controls were removed from a scene.
    ControlsDeleted {
        /// The scene that lost controls.
        scene_id: String,
        /// Identifiers of the removed controls.
        control_ids: Vec<String>,
    },
    /// A participant gave input.
    InputReceived(InputEvent),
    /// The session is near its memory limit.
    MemoryWarning(MemoryStats),
    /// The integration's ready state changed.
    Ready {
        /// Whether the integration now accepts participants.
        is_ready: bool,
    },
}

impl InteractiveEvent {
    /// Decode a pushed method packet into a typed event.
    ///
    /// Returns `Ok(None)` for methods this layer does not know, so callers
    /// can keep consuming a session that also carries newer pushes.
    ///
    /// # Errors
    ///
    /// Returns [`InteractiveError::EventDecode`] when the method is known
    /// but its params do not have the expected shape.
    pub fn from_packet(packet: &MethodPacket) -> Result<Option<Self>, InteractiveError> {
        let event = match packet.method.as_str() {
            methods::ON_PARTICIPANT_JOIN => {
                Self::ParticipantsJoined(body::<ParticipantsBody>(packet)?.participants)
            }
            methods::ON_PARTICIPANT_LEAVE => {
                Self::ParticipantsLeft(body::<ParticipantsBody>(packet)?.participants)
            }
            methods::ON_PARTICIPANT_UPDATE => {
                Self::ParticipantsUpdated(body::<ParticipantsBody>(packet)?.participants)
            }
            methods::ON_SCENE_CREATE => Self::ScenesCreated(body::<ScenesBody>(packet)?.scenes),
            methods::ON_SCENE_UPDATE => Self::ScenesUpdated(body::<ScenesBody>(packet)?.scenes),
            methods::ON_SCENE_DELETE => {
                let deleted = body::<SceneDeletedBody>(packet)?;
                Self::SceneDeleted {
                    scene_id: deleted.scene_id,
                    reassign_scene_id: deleted.reassign_scene_id,
                }
            }
            methods::ON_GROUP_CREATE => Self::GroupsCreated(body::<GroupsBody>(packet)?.groups),
            methods::ON_GROUP_UPDATE => Self::GroupsUpdated(body::<GroupsBody>(packet)?.groups),
            methods::ON_GROUP_DELETE => {
                let deleted = body::<GroupDeletedBody>(packet)?;
                Self::GroupDeleted {
                    group_id: deleted.group_id,
                    reassign_group_id: deleted.reassign_group_id,
                }
            }
            methods::ON_CONTROL_CREATE => {
                let changed = body::<ControlsBody>(packet)?;
                Self::ControlsCreated {
                    scene_id: changed.scene_id,
                    controls: changed.controls,
                }
            }
            methods::ON_CONTROL_UPDATE => {
                let changed = body::<ControlsBody>(packet)?;
                Self::ControlsUpdated {
                    scene_id: changed.scene_id,
                    controls: changed.controls,
                }
            }
            methods::ON_CONTROL_DELETE => {
                let deleted = body::<ControlsDeletedBody>(packet)?;
                Self::ControlsDeleted {
                    scene_id: deleted.scene_id,
                    control_ids: deleted.control_ids,
                }
            }
            methods::GIVE_INPUT => Self::InputReceived(body::<InputEvent>(packet)?),
            methods::ISSUE_MEMORY_WARNING => Self::MemoryWarning(body::<MemoryStats>(packet)?),
            methods::ON_READY => Self::Ready {
                is_ready: body::<ReadyBody>(packet)?.is_ready,
            },
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

fn body<T: DeserializeOwned>(packet: &MethodPacket) -> Result<T, InteractiveError> {
    serde_json::from_value(packet.params.clone()).map_err(|source| {
        InteractiveError::EventDecode {
            method: packet.method.clone(),
            source,
        }
    })
}

#[derive(Deserialize)]
struct ParticipantsBody {
    #[serde(default)]
    participants: Vec<Participant>,
}

#[derive(Deserialize)]
struct ScenesBody {
    #[serde(default)]
    scenes: Vec<Scene>,
}

#[derive(Deserialize)]
struct SceneDeletedBody {
    #[serde(rename = "sceneID")]
    scene_id: String,
    #[serde(rename = "reassignSceneID")]
    reassign_scene_id: String,
}

#[derive(Deserialize)]
struct GroupsBody {
    #[serde(default)]
    groups: Vec<Group>,
}

#[derive(Deserialize)]
struct GroupDeletedBody {
    #[serde(rename = "groupID")]
    group_id: String,
    #[serde(rename = "reassignGroupID")]
    reassign_group_id: String,
}

#[derive(Deserialize)]
struct ControlsBody {
    #[serde(rename = "sceneID")]
    scene_id: String,
    #[serde(default)]
    controls: Vec<Control>,
}

#[derive(Deserialize)]
struct ControlsDeletedBody {
    #[serde(rename = "sceneID")]
    scene_id: String,
    #[serde(rename = "controlIDs", default)]
    control_ids: Vec<String>,
}

#[derive(Deserialize)]
struct ReadyBody {
    #[serde(rename = "isReady", default)]
    is_ready: bool,
}

#[cfg(test)]
mod tests {
    use crowdplay_session::PacketId;
    use serde_json::json;

    use super::*;

    fn push(method: &str, params: serde_json::Value) -> MethodPacket {
        let mut packet = MethodPacket::call(PacketId::new(100), method, params);
        packet.seq = Some(7);
        packet
    }

    #[test]
    fn participant_join_decodes() {
        let packet = push(
            methods::ON_PARTICIPANT_JOIN,
            json!({"participants": [{
                "sessionID": "s-1",
                "userID": 42,
                "username": "viewer"
            }]}),
        );
        let event = InteractiveEvent::from_packet(&packet).unwrap().unwrap();
        let InteractiveEvent::ParticipantsJoined(participants) = event else {
            panic!("expected a join event");
        };
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].username, "viewer");
    }

    #[test]
    fn give_input_decodes_with_transaction() {
        let packet = push(
            methods::GIVE_INPUT,
            json!({
                "participantID": "s-1",
                "input": {"controlID": "fire", "event": "mousedown", "button": 0},
                "transactionID": "tx-1"
            }),
        );
        let event = InteractiveEvent::from_packet(&packet).unwrap().unwrap();
        let InteractiveEvent::InputReceived(input) = event else {
            panic!("expected an input event");
        };
        assert_eq!(input.input.control_id, "fire");
        assert_eq!(input.transaction_id.as_deref(), Some("tx-1"));
    }

    #[test]
    fn scene_delete_carries_the_reassignment() {
        let packet = push(
            methods::ON_SCENE_DELETE,
            json!({"sceneID": "lobby", "reassignSceneID": "default"}),
        );
        let event = InteractiveEvent::from_packet(&packet).unwrap().unwrap();
        assert_eq!(
            event,
            InteractiveEvent::SceneDeleted {
                scene_id: "lobby".to_owned(),
                reassign_scene_id: "default".to_owned(),
            }
        );
    }

    #[test]
    fn control_delete_lists_removed_ids() {
        let packet = push(
            methods::ON_CONTROL_DELETE,
            json!({"sceneID": "stage", "controlIDs": ["fire", "steer"]}),
        );
        let event = InteractiveEvent::from_packet(&packet).unwrap().unwrap();
        assert_eq!(
            event,
            InteractiveEvent::ControlsDeleted {
                scene_id: "stage".to_owned(),
                control_ids: vec!["fire".to_owned(), "steer".to_owned()],
            }
        );
    }

    #[test]
    fn memory_warning_reuses_the_stats_shape() {
        let packet = push(
            methods::ISSUE_MEMORY_WARNING,
            json!({"totalBytes": 2048, "usedBytes": 2000, "resources": [
                {"id": "stage", "ownBytes": 100, "cumulativeBytes": 1900}
            ]}),
        );
        let event = InteractiveEvent::from_packet(&packet).unwrap().unwrap();
        let InteractiveEvent::MemoryWarning(stats) = event else {
            panic!("expected a memory warning");
        };
        assert_eq!(stats.used_bytes, 2000);
        assert_eq!(stats.resources[0].cumulative_bytes, 1900);
    }

    #[test]
    fn ready_defaults_to_false_when_absent() {
        let packet = push(methods::ON_READY, json!({}));
        let event = InteractiveEvent::from_packet(&packet).unwrap().unwrap();
        assert_eq!(event, InteractiveEvent::Ready { is_ready: false });
    }

    #[test]
    fn unknown_methods_pass_through_as_none() {
        let packet = push("onSomethingNewer", json!({"whatever": true}));
        assert_eq!(InteractiveEvent::from_packet(&packet).unwrap(), None);
    }

    #[test]
    fn known_method_with_wrong_body_is_a_decode_error() {
        let packet = push(methods::ON_SCENE_DELETE, json!({"sceneID": 17}));
        let err = InteractiveEvent::from_packet(&packet).unwrap_err();
        assert!(matches!(
            err,
            InteractiveError::EventDecode { ref method, .. } if method == "onSceneDelete"
        ));
    }
}
