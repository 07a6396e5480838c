mod panel_counts;

pub use panel_counts::{run_panel, Params, PanelRun, SiteReport, SiteStatus};
