// commands.rs is also a module of the binary; the path attribute lets the
// integration tests reach it through the library.
#[path = "commands.rs"]
pub mod commands;

pub use commands::{handle_command, CommandResult};
