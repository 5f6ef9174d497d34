use pkg_constants::k8s::{DEFAULT_DURABLE_INSTANCE_TYPE, DEFAULT_EPHEMERAL_INSTANCE_TYPE};
use serde::{Deserialize, Serialize};

// --- Compute type ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ComputeType {
    /// Reserved capacity.
    #[default]
    Durable,
    /// Spot-like, interruptible capacity.
    Ephemeral,
}

impl ComputeType {
    /// Synthetic instance type signalled to the node provisioner.
    pub fn instance_type(&self) -> &'static str {
        match self {
            ComputeType::Durable => DEFAULT_DURABLE_INSTANCE_TYPE,
            ComputeType::Ephemeral => DEFAULT_EPHEMERAL_INSTANCE_TYPE,
        }
    }
}

impl std::fmt::Display for ComputeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComputeType::Durable => write!(f, "Durable"),
            ComputeType::Ephemeral => write!(f, "Ephemeral"),
        }
    }
}

// --- Catalog entry ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputeCost {
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, alias = "pricePerUnit")]
    pub price_per_unit: Option<f64>,
}

/// A purchasable VM class from the external provider catalog.
/// Every field is optional upstream; entries missing a numeric field are ineligible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputeConfiguration {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, alias = "providerName")]
    pub provider_name: Option<String>,
    #[serde(default, alias = "locationName")]
    pub location_name: Option<String>,
    #[serde(default, alias = "vCpu")]
    pub vcpu: Option<u32>,
    #[serde(default, alias = "ramGb")]
    pub ram_gb: Option<u32>,
    #[serde(default, alias = "volumeGb")]
    pub volume_gb: Option<u32>,
    #[serde(default, alias = "volumeType")]
    pub volume_type: Option<String>,
    #[serde(default, alias = "cloudNetworkTypes")]
    pub cloud_network_types: Vec<String>,
    #[serde(default)]
    pub cost: Option<ComputeCost>,
    #[serde(default, alias = "computeType")]
    pub compute_type: ComputeType,
}

impl ComputeConfiguration {
    pub fn price_per_unit(&self) -> Option<f64> {
        self.cost.as_ref().and_then(|c| c.price_per_unit)
    }

    /// `(vcpu, ram_gb, volume_gb)` when all are present and positive.
    pub fn resources(&self) -> Option<(f64, f64, f64)> {
        match (self.vcpu, self.ram_gb, self.volume_gb) {
            (Some(cpu), Some(ram), Some(volume)) if cpu > 0 && ram > 0 && volume > 0 => {
                Some((f64::from(cpu), f64::from(ram), f64::from(volume)))
            }
            _ => None,
        }
    }

    pub fn supports_network(&self, network_type: &str) -> bool {
        self.cloud_network_types.iter().any(|n| n == network_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resources_require_positive_fields() {
        let mut cfg = ComputeConfiguration {
            vcpu: Some(2),
            ram_gb: Some(8),
            volume_gb: Some(50),
            ..Default::default()
        };
        assert_eq!(cfg.resources(), Some((2.0, 8.0, 50.0)));

        cfg.ram_gb = Some(0);
        assert_eq!(cfg.resources(), None);

        cfg.ram_gb = None;
        assert_eq!(cfg.resources(), None);
    }

    #[test]
    fn deserializes_provider_field_names() {
        let json = r#"{
            "id": 7,
            "vCpu": 2,
            "ramGb": 4,
            "volumeGb": 20,
            "volumeType": "SSD",
            "cloudNetworkTypes": ["isolated", "10G"],
            "cost": {"unit": "HOURS", "currency": "EUR", "pricePerUnit": 0.05}
        }"#;
        let cfg: ComputeConfiguration = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.vcpu, Some(2));
        assert_eq!(cfg.price_per_unit(), Some(0.05));
        assert!(cfg.supports_network("10G"));
        assert!(!cfg.supports_network("1G"));
        assert_eq!(cfg.compute_type, ComputeType::Durable);
    }

    #[test]
    fn instance_type_follows_compute_type() {
        assert_eq!(ComputeType::Durable.instance_type(), "ultron.durable");
        assert_eq!(ComputeType::Ephemeral.instance_type(), "ultron.ephemeral");
    }
}
