pub mod chat;
pub mod usage;

pub use chat::*;
pub use usage::*;
