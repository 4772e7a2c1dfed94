mod command_input;
mod confirm;
mod edit_modal;
mod input;
mod key_result;
mod prompt;

pub use command_input::{CommandEvent, CommandInput};
pub use confirm::Confirm;
pub use edit_modal::{EditEvent, EditModal};
pub use key_result::KeyResult;
pub use prompt::{Prompt, PromptEvent};
