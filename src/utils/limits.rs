/// Bytes inspected by the content sniffer
pub const SNIFF_LEN: usize = 512;

/// Default request body cap, in MiB
pub const DEFAULT_MAX_UPLOAD_MB: u64 = 20;

pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Length of a hex-encoded object id (128 bits)
pub const OBJECT_ID_HEX_LEN: usize = 32;
