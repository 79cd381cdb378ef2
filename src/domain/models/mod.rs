mod author;
mod draft;
mod entry;
mod error;
mod slash_commands;
mod task;
mod task_service;

pub use author::*;
pub use draft::*;
pub use entry::*;
pub use error::*;
pub use slash_commands::*;
pub use task::*;
pub use task_service::*;
