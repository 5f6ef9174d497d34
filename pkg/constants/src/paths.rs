//! Filesystem path constants.

/// Default config file path for the server.
pub const DEFAULT_SERVER_CONFIG: &str = "/etc/ultron/config.yaml";

// ─── Exported TLS material ────────────────────────────────────────────────

pub const CA_CERT_FILENAME: &str = "ca.crt";
pub const SERVER_CERT_FILENAME: &str = "tls.crt";
pub const SERVER_KEY_FILENAME: &str = "tls.key";
