pub mod footer;
pub mod header;
pub mod recovery;
pub mod utils;

pub use footer::draw_footer;
pub use header::draw_header;
pub use recovery::draw_recovery_panel;
pub use utils::{completed_color, completed_label, truncate};
