//! Persistence module split across logical submodules. Both stores share one
//! SQLite key-value table and always read and write whole snapshots.

mod collections;
mod connection;
mod records;
mod transfer;

pub use collections::{add_collection, load_collections, save_collections, COLLECTIONS_KEY};
pub use connection::{default_data_dir, ensure_schema, open_store};
pub use records::{
    delete_record, generate_id, load_records, now_millis, save_records, upsert_record, RECORDS_KEY,
};
pub use transfer::{
    export_file_name, export_to_dir, export_to_json, import_from_file, import_from_json,
    ExportDocument, ImportSummary,
};
