//! Services module - async collaborators of the workout and coach screens.
//!
//! Nothing in here touches [`AppState`](crate::models::AppState) or
//! [`WorkoutSessionState`](crate::models::WorkoutSessionState) directly. Services
//! produce messages or values and the owning component applies them through a
//! reducer.
//!
//! # Components
//!
//! - [`RestTimer`]: the one-second countdown schedule for a workout session.
//!   Ticks are tagged with a generation so the session owner can drop ticks
//!   left over from a cancelled schedule.
//!
//! - [`CoachChat`]: session-only chat log with the AI coach. Talks to an
//!   [`AdviceProvider`] such as [`GeminiAdvisor`] and turns every failure into
//!   a fixed fallback message.
//!
//! - [`VideoProbe`]: checks whether an exercise video can be loaded and reports
//!   a [`MediaStatus`].
//!
//! # Usage Example
//!
//! ```ignore
//! use amaxfit::services::{CoachChat, GeminiAdvisor};
//!
//! let advisor = GeminiAdvisor::new(&settings.coach)?;
//! let mut chat = CoachChat::new(Arc::new(advisor), metrics);
//!
//! if let Some(reply) = chat.send("Suggest a workout").await {
//!     println!("{}", reply.text);
//! }
//! ```

pub mod coach;
pub mod media;
pub mod timer;

pub use coach::{
    AdviceProvider, ChatMessage, ChatRole, CoachChat, CoachError, GeminiAdvisor, OfflineAdvisor,
};
pub use media::{MediaStatus, VideoProbe};
pub use timer::{RestTimer, TimerTick, TimerTransition, TICK_PERIOD};
