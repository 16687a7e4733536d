// Shared constants (no magic values in adapters)
use std::time::Duration;

/// Default probe timeout (1s), applied to the connect and to each read
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Default probe method
pub const DEFAULT_PROBE_METHOD: &str = "GET";

/// Default probe path
pub const DEFAULT_PROBE_PATH: &str = "/";

/// The only status treated as "ready"
pub const HTTP_STATUS_OK: u16 = 200;

/// Exit code reported when the OS gives neither a code nor a signal
pub const UNKNOWN_EXIT_CODE: i32 = -1;
