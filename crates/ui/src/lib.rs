pub mod context;
pub mod controller;
pub mod event;
pub mod vm;

pub use context::{AppContext, UiApp};
pub use controller::{ControllerReply, QuizController};
pub use event::QuizEvent;
