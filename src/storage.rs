pub mod discovery;
pub use discovery::{DeltaFile, collect_delta_files, list_change_ids, list_spec_ids};
