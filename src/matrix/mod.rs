mod reader;
mod record;

pub use reader::{stream_records_into_channel, MatrixReader, RecordSource, SourceError};
pub use record::{split_alt, AlleleSlots, GenotypeCall, VariantRecord};
