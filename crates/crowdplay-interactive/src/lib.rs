//! Typed bindings for the interactive control protocol.
//!
//! [`InteractiveClient`] wraps an attached [`Session`] and exposes each wire
//! operation as a typed method: scenes of on-screen controls, participant
//! groups, roster queries, bandwidth throttles, and spark transaction
//! capture. [`InteractiveEvent`] decodes the pushes the service sends back,
//! participant input included.
//!
//! ```no_run
//! use crowdplay_interactive::{InteractiveClient, Scene, Session, SessionConfig};
//! use crowdplay_session::ws;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let (sink, source) = ws::connect("wss://interactive.example.com/gameClient").await?;
//! let client = InteractiveClient::new(Session::attach(sink, source, SessionConfig::default()));
//! let created = client.create_scenes(&[Scene::new("stage")]).await?;
//! client.ready(true).await?;
//! # let _ = created;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod events;
pub mod methods;
mod models;

pub use client::InteractiveClient;
pub use error::InteractiveError;
pub use events::InteractiveEvent;
pub use models::{
    ButtonControl, Control, ControlList, ControlPosition, Group, GroupList, Input, InputEvent,
    JoystickControl, MemoryStats, MethodThrottle, Participant, ParticipantPage, ResourceMemory,
    Scene, SceneList, ServerClock, ThrottleConfig, ThrottleLimit, ThrottleState,
};

// Re-exported so integrations can attach, subscribe, and match on session
// errors without depending on the session crate directly.
pub use crowdplay_session::{
    EventStream, Session, SessionConfig, SessionError, SessionEvent,
};
