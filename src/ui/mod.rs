pub mod binding;
pub mod panels;
pub mod theme;

pub use binding::Panel;
pub use panels::{PanelStatus, UiActions, draw_help_overlay, draw_side_panel};
pub use theme::apply_theme;
