mod room;
mod room_table;

pub use room::*;
pub use room_table::*;
