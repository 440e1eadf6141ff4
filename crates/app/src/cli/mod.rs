pub mod args;
pub mod op;
pub mod ops;

pub use ops::{AddNote, AddPassword, Init, List, Show, Version};
