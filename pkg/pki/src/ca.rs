use chrono::{Datelike, Duration, Utc};
use pkg_constants::network::CERTIFICATE_VALIDITY_DAYS;
use rcgen::{
    BasicConstraints, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa, KeyPair,
    KeyUsagePurpose, SanType,
};
use std::net::IpAddr;
use tracing::info;

use crate::tls::TlsBundle;

/// Subject of the webhook serving certificate.
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateRequest {
    pub organization: String,
    pub common_name: String,
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<IpAddr>,
}

fn split_csv(csv: &str) -> impl Iterator<Item = &str> {
    csv.split(',').map(str::trim).filter(|s| !s.is_empty())
}

impl CertificateRequest {
    /// Build a request from the comma-separated DNS and IP lists used in
    /// configuration. Blank items are skipped; a malformed IP is an error.
    pub fn from_csv(
        organization: &str,
        common_name: &str,
        dns_names: &str,
        ip_addresses: &str,
    ) -> anyhow::Result<Self> {
        let ip_addresses = split_csv(ip_addresses)
            .map(|ip| {
                ip.parse::<IpAddr>()
                    .map_err(|e| anyhow::anyhow!("invalid certificate IP address {}: {}", ip, e))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            organization: organization.to_string(),
            common_name: common_name.to_string(),
            dns_names: split_csv(dns_names).map(str::to_string).collect(),
            ip_addresses,
        })
    }
}

/// Validity window starting today.
fn validity(params: &mut CertificateParams) {
    let today = Utc::now().date_naive();
    let until = today + Duration::days(CERTIFICATE_VALIDITY_DAYS);
    params.not_before = rcgen::date_time_ymd(today.year(), today.month() as u8, today.day() as u8);
    params.not_after = rcgen::date_time_ymd(until.year(), until.month() as u8, until.day() as u8);
}

/// Self-signed certificate authority for the webhook. Its certificate is
/// the `caBundle` the cluster uses to trust the serving certificate.
pub struct WebhookCA {
    ca_cert_pem: String,
    ca_key_pair: KeyPair,
    ca_cert: rcgen::Certificate,
}

impl WebhookCA {
    /// Create a new CA with a freshly-generated self-signed root certificate.
    pub fn new(organization: &str) -> anyhow::Result<Self> {
        info!("Generating webhook CA for {}", organization);

        let mut params = CertificateParams::default();
        params
            .distinguished_name
            .push(DnType::CommonName, format!("{} webhook CA", organization));
        params
            .distinguished_name
            .push(DnType::OrganizationName, organization);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        validity(&mut params);

        let key_pair = KeyPair::generate()?;
        let ca_cert = params.self_signed(&key_pair)?;
        let ca_cert_pem = ca_cert.pem();

        Ok(Self {
            ca_cert_pem,
            ca_key_pair: key_pair,
            ca_cert,
        })
    }

    /// Issue the serving certificate, signed by this CA.
    pub fn issue_serving_cert(&self, request: &CertificateRequest) -> anyhow::Result<TlsBundle> {
        info!(
            "Issuing serving certificate CN={} (dns={} ip={})",
            request.common_name,
            request.dns_names.len(),
            request.ip_addresses.len()
        );

        let mut params = CertificateParams::default();
        params
            .distinguished_name
            .push(DnType::CommonName, request.common_name.as_str());
        params
            .distinguished_name
            .push(DnType::OrganizationName, request.organization.as_str());
        params.is_ca = IsCa::NoCa;
        params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
        ];
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
        for name in &request.dns_names {
            params
                .subject_alt_names
                .push(SanType::DnsName(name.clone().try_into()?));
        }
        for ip in &request.ip_addresses {
            params.subject_alt_names.push(SanType::IpAddress(*ip));
        }
        validity(&mut params);

        let key = KeyPair::generate()?;
        let cert = params.signed_by(&key, &self.ca_cert, &self.ca_key_pair)?;

        Ok(TlsBundle {
            ca_cert_pem: self.ca_cert_pem.clone(),
            cert_pem: cert.pem(),
            key_pem: key.serialize_pem(),
        })
    }

    /// Return the CA certificate PEM for the webhook configuration's `caBundle`.
    pub fn ca_cert_pem(&self) -> &str {
        &self.ca_cert_pem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_csv_lists() {
        let req = CertificateRequest::from_csv(
            "ultron",
            "ultron-service.default.svc",
            "ultron-service, ultron-service.default.svc,,",
            "127.0.0.1,::1",
        )
        .unwrap();
        assert_eq!(
            req.dns_names,
            vec!["ultron-service", "ultron-service.default.svc"]
        );
        assert_eq!(req.ip_addresses.len(), 2);
    }

    #[test]
    fn rejects_bad_ip() {
        assert!(CertificateRequest::from_csv("o", "cn", "", "10.0.0.300").is_err());
    }

    #[test]
    fn issues_serving_cert_signed_by_ca() {
        let ca = WebhookCA::new("ultron").unwrap();
        let req = CertificateRequest::from_csv("ultron", "ultron.local", "ultron.local", "127.0.0.1")
            .unwrap();
        let bundle = ca.issue_serving_cert(&req).unwrap();

        assert!(ca.ca_cert_pem().contains("BEGIN CERTIFICATE"));
        assert_eq!(bundle.ca_cert_pem, ca.ca_cert_pem());
        assert!(bundle.cert_pem.contains("BEGIN CERTIFICATE"));
        assert!(bundle.key_pem.contains("PRIVATE KEY"));
        assert_ne!(bundle.cert_pem, bundle.ca_cert_pem);
    }
}
