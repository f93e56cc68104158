//! Column family definitions for RocksDB.
//!
//! Each column family isolates data with different access patterns:
//! - records: serialized records keyed by type and primary key
//! - sequences: next primary key per record type
//! - record_types: registered record type declarations

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family name for records
pub const CF_RECORDS: &str = "records";

/// Column family name for per-type primary key sequences
pub const CF_SEQUENCES: &str = "sequences";

/// Column family name for record type declarations
pub const CF_RECORD_TYPES: &str = "record_types";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[CF_RECORDS, CF_SEQUENCES, CF_RECORD_TYPES];

/// Create column family options for records (compressed)
fn records_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(CF_RECORDS, records_options()),
        ColumnFamilyDescriptor::new(CF_SEQUENCES, Options::default()),
        ColumnFamilyDescriptor::new(CF_RECORD_TYPES, Options::default()),
    ]
}
