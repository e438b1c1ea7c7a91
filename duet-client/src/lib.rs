mod coordinator;
mod error;
mod media;
mod session;
mod signaling;
mod transport;

pub use coordinator::*;
pub use error::*;
pub use media::*;
pub use session::*;
pub use signaling::*;
pub use transport::*;
