mod app;
mod config;
mod error;
mod registry;
mod room;
mod signaling;

pub use app::*;
pub use config::*;
pub use error::*;
pub use registry::*;
pub use room::*;
pub use signaling::*;
