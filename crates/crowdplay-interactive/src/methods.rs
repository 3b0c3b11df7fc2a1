//! Wire method names, spelled the way the service expects them.

/// Signal that the integration is (or is no longer) ready for participants.
pub const READY: &str = "ready";
/// Fetch the server wall clock.
pub const GET_TIME: &str = "getTime";
/// Fetch the current memory usage report.
pub const GET_MEMORY_STATS: &str = "getMemoryStats";
/// Install per-method bandwidth limits.
pub const SET_BANDWIDTH_THROTTLE: &str = "setBandwidthThrottle";
/// Fetch per-method throttle counters.
pub const GET_THROTTLE_STATE: &str = "getThrottleState";
/// Fetch a page of the participant roster.
pub const GET_ALL_PARTICIPANTS: &str = "getAllParticipants";
/// Fetch participants who gave input after a threshold instant.
pub const GET_ACTIVE_PARTICIPANTS: &str = "getActiveParticipants";
/// Rewrite attributes of connected participants.
pub const UPDATE_PARTICIPANTS: &str = "updateParticipants";
/// Create participant groups.
pub const CREATE_GROUPS: &str = "createGroups";
/// Fetch every group.
pub const GET_GROUPS: &str = "getGroups";
/// Rewrite existing groups.
pub const UPDATE_GROUPS: &str = "updateGroups";
/// Delete a group, moving its participants elsewhere.
pub const DELETE_GROUP: &str = "deleteGroup";
/// Create scenes.
pub const CREATE_SCENES: &str = "createScenes";
/// Fetch every scene.
pub const GET_SCENES: &str = "getScenes";
/// Rewrite existing scenes.
pub const UPDATE_SCENES: &str = "updateScenes";
/// Delete a scene, moving its groups elsewhere.
pub const DELETE_SCENE: &str = "deleteScene";
/// Add controls to a scene.
pub const CREATE_CONTROLS: &str = "createControls";
/// Rewrite controls on a scene.
pub const UPDATE_CONTROLS: &str = "updateControls";
/// Remove controls from a scene.
pub const DELETE_CONTROLS: &str = "deleteControls";
/// Capture a spark transaction attached to an input.
pub const CAPTURE: &str = "capture";

/// Push: participants joined the session.
pub const ON_PARTICIPANT_JOIN: &str = "onParticipantJoin";
/// Push: participants left the session.
pub const ON_PARTICIPANT_LEAVE: &str = "onParticipantLeave";
/// Push: participant attributes changed.
pub const ON_PARTICIPANT_UPDATE: &str = "onParticipantUpdate";
/// Push: scenes were created.
pub const ON_SCENE_CREATE: &str = "onSceneCreate";
/// Push: scenes were rewritten.
pub const ON_SCENE_UPDATE: &str = "onSceneUpdate";
/// Push: a scene was deleted.
pub const ON_SCENE_DELETE: &str = "onSceneDelete";
/// Push: groups were created.
pub const ON_GROUP_CREATE: &str = "onGroupCreate";
/// Push: groups were rewritten.
pub const ON_GROUP_UPDATE: &str = "onGroupUpdate";
/// Push: a group was deleted.
pub const ON_GROUP_DELETE: &str = "onGroupDelete";
/// Push: controls were created.
pub const ON_CONTROL_CREATE: &str = "onControlCreate";
/// Push: controls were rewritten.
pub const ON_CONTROL_UPDATE: &str = "onControlUpdate";
/// Push: controls were deleted.
pub const ON_CONTROL_DELETE: &str = "onControlDelete";
/// Push: a participant gave input.
pub const GIVE_INPUT: &str = "giveInput";
/// Push: the session is near its memory limit.
pub const ISSUE_MEMORY_WARNING: &str = "issueMemoryWarning";
/// Push: the integration's ready state changed.
pub const ON_READY: &str = "onReady";
