//! Real-Time Chat Module
//!
//! Room-based chat over WebSockets with a persisted message log and roster.
//!
//! ## Core Concepts
//! - **Room record** (`ChatRoom`): capped message log (oldest evicted first),
//!   roster of every user who ever joined, soft-delete flag.
//! - **Presence** (`PresenceTracker`): who is online in which room right now.
//!   Live state only; never persisted and independent of the roster.
//! - **Single writer per room** (`RoomHub`): all writes to a room go through
//!   one bounded queue, so append order is broadcast order.
//! - **Session** (`ChatSession`): per-connection state machine driven by typed
//!   client events; errors go back to the originating connection only.
//!
//! ## Submodules
//! - **`types`**: room record and wire events.
//! - **`store`**: repository seam and room lifecycle rules.
//! - **`presence`**: presence tracking.
//! - **`hub`**: room writers and fan-out.
//! - **`session`**: connection state machine.
//! - **`socket`**: WebSocket transport.
//! - **`handlers`**: HTTP read endpoints.

pub mod handlers;
pub mod hub;
pub mod presence;
pub mod session;
pub mod socket;
pub mod store;
pub mod types;
