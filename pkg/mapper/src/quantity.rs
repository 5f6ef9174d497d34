//! Kubernetes resource quantity parsing (`500m`, `1.5`, `512Mi`, `1G`, `1e3`).

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use pkg_constants::k8s::BYTES_PER_GIB;

use crate::error::MapperError;

/// Sub-unit suffixes divide so that `500m` is exactly `0.5`.
enum Scale {
    Mul(f64),
    Div(f64),
}

fn scale(suffix: &str) -> Option<Scale> {
    let m = match suffix {
        "n" => return Some(Scale::Div(1e9)),
        "u" => return Some(Scale::Div(1e6)),
        "m" => return Some(Scale::Div(1e3)),
        "" => 1.0,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        "Ki" => 1024.0,
        "Mi" => 1024.0_f64.powi(2),
        "Gi" => 1024.0_f64.powi(3),
        "Ti" => 1024.0_f64.powi(4),
        "Pi" => 1024.0_f64.powi(5),
        "Ei" => 1024.0_f64.powi(6),
        _ => return None,
    };
    Some(Scale::Mul(m))
}

/// Parse a quantity string into its base unit (cores or bytes).
/// Negative quantities are rejected.
pub fn parse_quantity(field: &str, raw: &str) -> Result<f64, MapperError> {
    let invalid = || MapperError::InvalidQuantity {
        field: field.to_string(),
        value: raw.to_string(),
    };

    let s = raw.trim();
    let split = s
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '+' || *c == '-'))))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let (number, suffix) = s.split_at(split);

    let base: f64 = number.parse().map_err(|_| invalid())?;
    if base < 0.0 || !base.is_finite() {
        return Err(invalid());
    }

    match suffix.strip_prefix(['e', 'E']) {
        Some(exp) if !exp.is_empty() => {
            let exp: i32 = exp.parse().map_err(|_| invalid())?;
            Ok(base * 10f64.powi(exp))
        }
        _ => match scale(suffix).ok_or_else(invalid)? {
            Scale::Mul(m) => Ok(base * m),
            Scale::Div(d) => Ok(base / d),
        },
    }
}

/// CPU quantity in fractional cores.
pub fn cpu_cores(field: &str, q: &Quantity) -> Result<f64, MapperError> {
    parse_quantity(field, &q.0)
}

/// Memory or storage quantity in GiB.
pub fn gibibytes(field: &str, q: &Quantity) -> Result<f64, MapperError> {
    Ok(parse_quantity(field, &q.0)? / BYTES_PER_GIB)
}
