pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    draft_marker, error, header, info, section, success, summary_row, sync_summary, timing, warn,
};
pub use table::{pages_table, stats_table, TableBuilder};
pub use theme::{err_theme, theme, Theme};
