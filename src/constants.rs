// Search tiers
pub const PRIORITY_EXACT: u8 = 100;
pub const PRIORITY_PREFIX: u8 = 80;
pub const PRIORITY_CONTAINS: u8 = 60;
pub const PRIORITY_KEYWORD: u8 = 40;

// Tokenizer
/// Characters folded into whitespace before splitting.
pub const TOKEN_SEPARATORS: [char; 3] = ['/', '_', '-'];
/// Tokens must be strictly longer than this many UTF-8 bytes.
pub const TOKEN_MIN_EXCLUSIVE_LEN: usize = 1;

// Cache
/// Number of distinct search queries memoised per service.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

// Data layout
pub const DEFAULT_DATA_DIR: &str = "data";
pub const METADATA_FILE: &str = "metadata.yaml";

// Export
pub const EXPORT_FORMAT_VERSION: &str = "1.0.0";

// Presentation
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_API_LIMIT: usize = 15;
pub const DEFAULT_TOP_K: usize = 20;
