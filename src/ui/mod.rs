//! Terminal UI layer for interactive chat sessions.
//!
//! The UI module owns rendering, layout, keyboard handling, and loop control
//! for the text user interface.
//!
//! Key submodules include:
//! - [`chat_loop`]: the main interaction loop that dispatches user input to
//!   [`crate::commands`] and hands submitted turns to [`crate::core::turn`].
//! - [`renderer`] and [`scroll`]: view composition and transcript layout.
//! - [`markdown`]: assistant message rendering.
//! - [`theme`]: color/style policy.
//! - [`picker`]: model selection overlay.
//!
//! Ownership boundary: this layer presents and captures interaction state, while
//! [`crate::core`] owns domain logic and backend coordination.

pub mod chat_loop;
pub mod markdown;
pub mod picker;
pub mod renderer;
pub mod scroll;
pub mod theme;
