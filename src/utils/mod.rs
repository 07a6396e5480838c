mod readers;
mod util;

pub use readers::{is_gzipped, open_text_reader};
pub use util::{format_number_with_commas, handle_error_and_exit, Result};
