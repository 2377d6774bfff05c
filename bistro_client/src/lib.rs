//! Client-side state machines for the Bistro order platform.
//!
//! Everything here is deterministic and side-effect free: the basket reducer, the optimistic
//! chat transcript and the notification feed each expose synchronous state transitions, with
//! storage and network abstracted behind traits or driven by the caller. A UI layer (web, TUI,
//! tests) owns the event loop and the I/O and calls into these types.

pub mod basket;
pub mod chat;
pub mod notifications;

pub use basket::{composite_identity, Basket, BasketAction, BasketError, BasketLine, BasketStorage};
pub use chat::{ChatTranscript, TranscriptEntry};
pub use notifications::NotificationFeed;
