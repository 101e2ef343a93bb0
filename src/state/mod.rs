//! State management module
//!
//! This module handles conversation state and user sessions

pub mod context;
pub mod machine;
pub mod storage;

// Re-export commonly used state components
pub use context::{AppContext, UserSession};
pub use machine::{transition, AdminFlowId, AdminMenuChoice, ConversationState, Trigger};
pub use storage::{MemorySessionStore, RedisSessionStore, SessionStore};
