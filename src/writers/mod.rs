mod atomic;
mod write_diagnostics;
mod write_table;

pub use atomic::{stage_file, StagedFile};
pub use write_diagnostics::{stage_diagnostics, write_diagnostics};
pub use write_table::CountTable;
