//! Height resolver
//!
//! Determines a feature's base height value and its provenance from
//! heterogeneous sources, in fixed precedence order: geometry Z coordinate,
//! caller-specified attribute hint, then a fixed probe list of conventional
//! attribute names. Each candidate is guarded independently: a value that
//! fails to parse is logged as a notice and resolution continues. Absence
//! of any height source is a legitimate terminal state, not a failure.
//!
//! Generic `HEIGHT`/`height` attributes are deliberately absent from the
//! probe list: source datasets disagree on whether they carry base
//! elevation or object (extrusion) height, so they are honored only via
//! the explicit caller hint.

use crate::domain::geometry::RawGeometry;
use serde_json::{Map, Value};

/// Conventional base-elevation attribute names, probed in order
const PROBED_HEIGHT_ATTRIBUTES: [&str; 7] = [
    "H_MEAN",
    "HMEAN",
    "MEAN_HEIGHT",
    "ELEVATION",
    "ELEV",
    "HOEHE",
    "H",
];

/// A resolved height value with its provenance tag
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedHeight {
    /// The numeric height in the source frame's vertical datum
    pub value: f64,

    /// Provenance, e.g. "z_coord" or "attribute:H_MEAN"
    pub source: String,
}

impl ResolvedHeight {
    fn from_z(value: f64) -> Self {
        Self {
            value,
            source: "z_coord".to_string(),
        }
    }

    fn from_attribute(name: &str, value: f64) -> Self {
        Self {
            value,
            source: format!("attribute:{name}"),
        }
    }
}

/// Resolves base heights for features of one import job
#[derive(Debug, Clone, Default)]
pub struct HeightResolver {
    hint: Option<String>,
}

impl HeightResolver {
    /// Creates a resolver with an optional caller-specified attribute hint
    pub fn new(hint: Option<String>) -> Self {
        Self { hint }
    }

    /// Resolves a feature's height, first success wins
    ///
    /// Parse failures are pushed onto `notices` and never raise; `None`
    /// means no height source exists for this feature.
    pub fn resolve(
        &self,
        geometry: &RawGeometry,
        attributes: &Map<String, Value>,
        notices: &mut Vec<String>,
    ) -> Option<ResolvedHeight> {
        if let Some(z) = geometry.first_z() {
            if z.is_finite() {
                return Some(ResolvedHeight::from_z(z));
            }
            notices.push("ignoring non-finite Z coordinate".to_string());
        }

        if let Some(name) = &self.hint {
            match parse_numeric(attributes.get(name)) {
                Some(value) => return Some(ResolvedHeight::from_attribute(name, value)),
                None => {
                    if attributes.contains_key(name) {
                        notices.push(format!(
                            "height attribute '{name}' is not numeric, trying conventional names"
                        ));
                    }
                }
            }
        }

        for name in PROBED_HEIGHT_ATTRIBUTES {
            match parse_numeric(attributes.get(name)) {
                Some(value) => return Some(ResolvedHeight::from_attribute(name, value)),
                None => {
                    if attributes.contains_key(name) {
                        notices.push(format!("attribute '{name}' present but not numeric"));
                    }
                }
            }
        }

        None
    }
}

/// Parses an attribute value as a finite number
///
/// Accepts JSON numbers and numeric strings; everything else is `None`.
fn parse_numeric(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    parsed.is_finite().then_some(parsed)
}
