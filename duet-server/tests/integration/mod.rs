//! Integration tests for duet-server.
//!
//! - `room_tests` - joining, leaving and pairing through the room table
//! - `relay_tests` - forwarding signaling messages between a pair
//! - `ws_tests` - the same flows end to end over real WebSockets

pub mod room_tests;

use tracing::Level;

/// Initialize tracing for tests (call once per test).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}
