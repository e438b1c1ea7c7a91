
pub use call_pair::*;
pub use mock_media::*;
pub use mock_transport::*;
pub use recording_link::*;
pub use test_server::*;
