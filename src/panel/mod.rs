mod entry;
mod loader;

pub use entry::{PanelEntry, SiteType, TargetAllele};
pub use loader::{load_panel, read_panel, Panel};
