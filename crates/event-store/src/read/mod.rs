pub mod export;

pub use export::{export_entries, write_export_file, ExportFormat};
