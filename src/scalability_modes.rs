//! Parsing of encoding scalability modes such as `L1T3`, `S3T3` or `L2T2_KEY`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static SCALABILITY_MODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[LS]([1-9][0-9]?)T([1-9][0-9]?)(_KEY)?").expect("Scalability mode regex is valid")
});

/// Number of spatial and temporal layers of an RTP stream.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalabilityMode {
    /// Number of spatial layers.
    pub spatial_layers: u8,
    /// Number of temporal layers.
    pub temporal_layers: u8,
    /// K-SVC mode (`_KEY` suffix).
    pub ksvc: bool,
}

impl Default for ScalabilityMode {
    fn default() -> Self {
        Self {
            spatial_layers: 1,
            temporal_layers: 1,
            ksvc: false,
        }
    }
}

/// Parse scalability mode string, unknown or malformed strings yield single layer `L1T1`.
#[must_use]
pub fn parse(scalability_mode: &str) -> ScalabilityMode {
    SCALABILITY_MODE_REGEX
        .captures(scalability_mode)
        .and_then(|captures| {
            Some(ScalabilityMode {
                spatial_layers: captures.get(1)?.as_str().parse().ok()?,
                temporal_layers: captures.get(2)?.as_str().parse().ok()?,
                ksvc: captures.get(3).is_some(),
            })
        })
        .unwrap_or_default()
}
