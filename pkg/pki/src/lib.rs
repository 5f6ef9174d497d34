//! TLS bootstrap for the admission webhook: a self-signed CA, the serving
//! certificate it signs, PEM export and the rustls server configuration.

pub mod ca;
pub mod tls;

pub use ca::{CertificateRequest, WebhookCA};
pub use tls::TlsBundle;
