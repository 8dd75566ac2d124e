//! Realtime session core for the Pai assistant.
//!
//! - [`event`]: realtime events received from and sent to the service.
//! - [`reducer`]: the pure state machine that decides which tool output is
//!   current, when the tool registry is sent and which renders, lookups and
//!   follow-ups to start.
//! - [`driver`]: an async task that owns the reducer state, executes its
//!   effects and publishes snapshots for the UI.

pub mod driver;
pub mod event;
pub mod reducer;

pub use driver::{DriverStopped, SessionDriver, SessionHandle};
pub use event::{ClientEvent, ResponseOutputItem, ServerEvent};
pub use reducer::{
    reduce, Effect, Input, Phase, ReducerOptions, RenderSlot, RenderStatus, SessionSnapshot,
    SessionState, Slot,
};
