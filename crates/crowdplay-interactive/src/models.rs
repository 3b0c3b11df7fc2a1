//! Domain models, shaped exactly as they travel on the wire.
//!
//! Identifier fields use the service's `...ID` spelling, so they carry
//! explicit renames on top of the camelCase defaults.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Grid placement of a control within one screen-size layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPosition {
    /// Layout this placement belongs to: `large`, `medium`, or `small`.
    pub size: String,
    /// Width in grid units.
    pub width: u32,
    /// Height in grid units.
    pub height: u32,
    /// Horizontal grid offset.
    pub x: u32,
    /// Vertical grid offset.
    pub y: u32,
}

impl ControlPosition {
    /// Place a control on the named layout grid.
    #[must_use]
    pub fn new(size: impl Into<String>, width: u32, height: u32, x: u32, y: u32) -> Self {
        Self {
            size: size.into(),
            width,
            height,
            x,
            y,
        }
    }
}

/// A pressable button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonControl {
    /// Identifier, unique within the scene.
    #[serde(rename = "controlID")]
    pub control_id: String,
    /// Label shown on the button.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Spark cost charged per press.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<u64>,
    /// Whether the button currently rejects input.
    #[serde(default)]
    pub disabled: bool,
    /// Cooldown expiry, ms since epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<u64>,
    /// Fill fraction of the progress bar, `0.0..=1.0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    /// Placements per layout grid.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub position: Vec<ControlPosition>,
    /// Server-assigned entity tag, echoed back on updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl ButtonControl {
    /// A minimal enabled button.
    #[must_use]
    pub fn new(control_id: impl Into<String>) -> Self {
        Self {
            control_id: control_id.into(),
            text: None,
            cost: None,
            disabled: false,
            cooldown: None,
            progress: None,
            position: Vec::new(),
            etag: None,
        }
    }
}

/// A directional joystick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoystickControl {
    /// Identifier, unique within the scene.
    #[serde(rename = "controlID")]
    pub control_id: String,
    /// Whether the joystick currently rejects input.
    #[serde(default)]
    pub disabled: bool,
    /// Input sampling interval in ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u64>,
    /// Pointer angle in radians.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    /// Pointer magnitude, `0.0..=1.0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f64>,
    /// Placements per layout grid.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub position: Vec<ControlPosition>,
    /// Server-assigned entity tag, echoed back on updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl JoystickControl {
    /// A minimal enabled joystick.
    #[must_use]
    pub fn new(control_id: impl Into<String>) -> Self {
        Self {
            control_id: control_id.into(),
            disabled: false,
            sample_rate: None,
            angle: None,
            intensity: None,
            position: Vec::new(),
            etag: None,
        }
    }
}

/// One on-screen control. The wire discriminates on `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Control {
    /// `"kind": "button"`
    Button(ButtonControl),
    /// `"kind": "joystick"`
    Joystick(JoystickControl),
}

impl Control {
    /// The control's identifier, whichever kind it is.
    #[must_use]
    pub fn control_id(&self) -> &str {
        match self {
            Self::Button(button) => &button.control_id,
            Self::Joystick(joystick) => &joystick.control_id,
        }
    }
}

/// A scene: one named set of controls participants can be shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// Identifier, unique within the session.
    #[serde(rename = "sceneID")]
    pub scene_id: String,
    /// Controls laid out on this scene.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub controls: Vec<Control>,
    /// Server-assigned entity tag, echoed back on updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl Scene {
    /// An empty scene.
    #[must_use]
    pub fn new(scene_id: impl Into<String>) -> Self {
        Self {
            scene_id: scene_id.into(),
            controls: Vec::new(),
            etag: None,
        }
    }
}

/// A participant group. Every group shows exactly one scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Identifier, unique within the session.
    #[serde(rename = "groupID")]
    pub group_id: String,
    /// The scene this group is shown.
    #[serde(rename = "sceneID")]
    pub scene_id: String,
    /// Server-assigned entity tag, echoed back on updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl Group {
    /// A group pointing at `scene_id`.
    #[must_use]
    pub fn new(group_id: impl Into<String>, scene_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            scene_id: scene_id.into(),
            etag: None,
        }
    }
}

/// A connected viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Connection-scoped identifier.
    #[serde(rename = "sessionID")]
    pub session_id: String,
    /// Stable account identifier.
    #[serde(rename = "userID")]
    pub user_id: u64,
    /// Display name.
    pub username: String,
    /// Channel rank of the viewer.
    #[serde(default)]
    pub level: u32,
    /// Last input instant, ms since epoch.
    #[serde(default)]
    pub last_input_at: u64,
    /// Join instant, ms since epoch.
    #[serde(default)]
    pub connected_at: u64,
    /// Whether the participant's input is ignored.
    #[serde(default)]
    pub disabled: bool,
    /// Group this participant belongs to.
    #[serde(rename = "groupID", default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

/// One page of the participant roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantPage {
    /// Participants on this page.
    #[serde(default)]
    pub participants: Vec<Participant>,
    /// Roster size across all pages, when the server reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Whether another page exists past this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
}

/// Reply body of `getScenes`, `createScenes`, and `updateScenes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneList {
    /// The scenes, in server order.
    #[serde(default)]
    pub scenes: Vec<Scene>,
}

/// Reply body of `getGroups` and `updateGroups`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupList {
    /// The groups, in server order.
    #[serde(default)]
    pub groups: Vec<Group>,
}

/// Reply body of `updateControls`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlList {
    /// The controls, in server order.
    #[serde(default)]
    pub controls: Vec<Control>,
}

/// Memory usage report: the reply of `getMemoryStats` and the body of the
/// `issueMemoryWarning` push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    /// Bytes the session may use in total.
    #[serde(default)]
    pub total_bytes: u64,
    /// Bytes currently in use.
    #[serde(default)]
    pub used_bytes: u64,
    /// Per-resource breakdown.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceMemory>,
}

/// Memory attributed to one resource (a scene or a control).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMemory {
    /// Resource identifier.
    pub id: String,
    /// Bytes held by the resource itself.
    #[serde(default)]
    pub own_bytes: u64,
    /// Bytes held by the resource and everything under it.
    #[serde(default)]
    pub cumulative_bytes: u64,
}

/// Token-bucket limit for one wire method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThrottleLimit {
    /// Bucket size in bytes.
    pub capacity: u64,
    /// Bytes drained from the bucket per second.
    pub drain_rate: u64,
}

/// Per-method limits sent with `setBandwidthThrottle`. Serializes as a map
/// keyed by wire method name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThrottleConfig {
    limits: BTreeMap<String, ThrottleLimit>,
}

impl ThrottleConfig {
    /// An empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the limit for one wire method, builder style.
    #[must_use]
    pub fn limit(mut self, method: impl Into<String>, capacity: u64, drain_rate: u64) -> Self {
        let _ = self.limits.insert(
            method.into(),
            ThrottleLimit {
                capacity,
                drain_rate,
            },
        );
        self
    }

    /// The configured limit for `method`, if any.
    #[must_use]
    pub fn get(&self, method: &str) -> Option<&ThrottleLimit> {
        self.limits.get(method)
    }

    /// Number of configured methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.limits.len()
    }

    /// Whether no method is throttled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }
}

/// Traffic counters for one throttled method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodThrottle {
    /// Packets admitted into the bucket.
    #[serde(default)]
    pub inserted: u64,
    /// Packets rejected by the bucket.
    #[serde(default)]
    pub rejected: u64,
}

/// Reply body of `getThrottleState`: counters keyed by wire method name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThrottleState {
    /// Per-method counters.
    pub methods: BTreeMap<String, MethodThrottle>,
}

/// Reply body of `getTime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerClock {
    /// Server wall clock.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub time: DateTime<Utc>,
}

/// A participant input report, the body of the `giveInput` push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputEvent {
    /// Session id of the participant who acted.
    #[serde(rename = "participantID")]
    pub participant_id: String,
    /// What they did.
    pub input: Input,
    /// Present when the input carries a spark charge to capture.
    #[serde(rename = "transactionID", default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

/// The control-specific half of an input report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    /// Control that produced the input.
    #[serde(rename = "controlID")]
    pub control_id: String,
    /// Input kind: `mousedown`, `mouseup`, `move`, ...
    pub event: String,
    /// Kind-specific extras (button number, joystick coordinates, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}
