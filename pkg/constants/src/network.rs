//! Network-related constants.

/// Default bind address of the admission webhook.
pub const DEFAULT_SERVER_ADDRESS: &str = ":8443";

/// Default per-admission deadline, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default Redis database index.
pub const DEFAULT_REDIS_DATABASE: i64 = 0;

// ─── Serving certificate ──────────────────────────────────────────────────

pub const DEFAULT_CERTIFICATE_ORGANIZATION: &str = "ultron";
pub const DEFAULT_CERTIFICATE_COMMON_NAME: &str = "ultron-service.default.svc";
pub const DEFAULT_CERTIFICATE_DNS_NAMES: &str =
    "ultron-service,ultron-service.default,ultron-service.default.svc";
pub const DEFAULT_CERTIFICATE_IP_ADDRESSES: &str = "127.0.0.1";

/// Validity of issued certificates, in days.
pub const CERTIFICATE_VALIDITY_DAYS: i64 = 365;
