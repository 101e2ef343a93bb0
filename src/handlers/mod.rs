//! Bot handlers module
//!
//! Thin teloxide glue: each handler turns an update into an
//! [`InboundEvent`](crate::controller::InboundEvent) and passes it to the
//! controller.
//! - Command handlers for `/start`, `/admin`, `/reset`
//! - Callback handlers for inline keyboard presses
//! - Message handlers for free text

pub mod commands;
pub mod callbacks;
pub mod messages;

// Re-export commonly used handler functions
pub use commands::{handle_command, Command};
pub use callbacks::handle_callback_query;
pub use messages::handle_message;
