mod task_session;
mod transcript;

pub use task_session::*;
pub use transcript::*;
