//! Test helpers module
//!
//! Recording chat transport, scripted provider gateway, a mock Telegram API
//! server and a test context wiring them to a real controller.

#![allow(dead_code)]

pub mod fake_gateway;
pub mod mock_transport;
pub mod telegram_mock;
pub mod test_context;

pub use fake_gateway::*;
pub use mock_transport::*;
pub use telegram_mock::*;
pub use test_context::*;
