//! Terminal rendering for the CLI: styled tables, spinners and themed
//! status lines.

pub mod progress;
pub mod tables;
pub mod theme;

pub use progress::{StageProgress, create_spinner, with_spinner};
pub use tables::{
    TableBuilder, create_cluster_table, create_metrics_table, create_similarity_table,
    create_timing_table,
};
pub use theme::{THEME, Theme};
