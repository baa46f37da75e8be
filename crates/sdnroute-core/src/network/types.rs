use std::fmt;
use std::str::FromStr;

use crate::units::{Volume, Weight};

/// A node identifier. Identifiers are compared case-sensitively.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::Display,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_new::new, serde::Serialize, serde::Deserialize)]
pub struct Node {
    pub id: NodeId,
}

/// A bidirectional link between two distinct nodes.
#[derive(Debug, Clone, PartialEq, Eq, derive_new::new, serde::Serialize)]
pub struct Link {
    pub a: NodeId,
    pub b: NodeId,
    pub weight: Weight,
    pub capacity: Volume,
    /// Sum of the volumes of all routed flows crossing this link.
    #[new(default)]
    pub utilization: Volume,
    #[new(value = "true")]
    pub active: bool,
}

impl Link {
    pub fn connects(&self, x: &NodeId, y: &NodeId) -> bool {
        self.a == *x && self.b == *y || self.a == *y && self.b == *x
    }

    pub fn is_incident(&self, x: &NodeId) -> bool {
        self.a == *x || self.b == *x
    }

    /// Utilization as a fraction of capacity. May exceed 1.0 on an oversubscribed link.
    pub fn utilization_ratio(&self) -> f64 {
        self.utilization.into_f64() / self.capacity.into_f64()
    }

    /// The endpoints ordered so that the smaller identifier comes first.
    pub fn endpoints(&self) -> (&NodeId, &NodeId) {
        if self.a <= self.b {
            (&self.a, &self.b)
        } else {
            (&self.b, &self.a)
        }
    }

    pub(crate) fn fail(&mut self) {
        self.active = false;
        self.utilization = Volume::ZERO;
    }

    pub(crate) fn restore(&mut self, weight: Weight, capacity: Volume) {
        self.weight = weight;
        self.capacity = capacity;
        self.utilization = Volume::ZERO;
        self.active = true;
    }
}

/// Traffic classes, highest priority first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TrafficType {
    Alerts,
    Voice,
    Video,
    Data,
}

impl TrafficType {
    pub const ALL: [TrafficType; 4] = [
        TrafficType::Alerts,
        TrafficType::Voice,
        TrafficType::Video,
        TrafficType::Data,
    ];

    /// The fixed priority rank of this class. Higher is more urgent.
    pub const fn priority(self) -> u8 {
        match self {
            TrafficType::Alerts => 4,
            TrafficType::Voice => 3,
            TrafficType::Video => 2,
            TrafficType::Data => 1,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            TrafficType::Alerts => "alerts",
            TrafficType::Voice => "voice",
            TrafficType::Video => "video",
            TrafficType::Data => "data",
        }
    }
}

impl fmt::Display for TrafficType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrafficType {
    type Err = UnknownTrafficType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrafficType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownTrafficType(s.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown traffic type `{0}` (expected one of alerts, voice, video, data)")]
pub struct UnknownTrafficType(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priorities_are_strictly_ordered() {
        let ranks = TrafficType::ALL.map(TrafficType::priority);
        assert!(ranks.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn traffic_type_parses_any_case() {
        assert_eq!("VOICE".parse::<TrafficType>(), Ok(TrafficType::Voice));
        assert_eq!("alerts".parse::<TrafficType>(), Ok(TrafficType::Alerts));
        assert!("bulk".parse::<TrafficType>().is_err());
    }

    #[test]
    fn link_connects_either_direction() {
        let l = Link::new("A".into(), "B".into(), Weight::ONE, Volume::new(10));
        assert!(l.connects(&NodeId::new("B"), &NodeId::new("A")));
        assert!(!l.connects(&NodeId::new("A"), &NodeId::new("C")));
        assert!(l.active);
        assert_eq!(l.utilization, Volume::ZERO);
    }

    #[test]
    fn failing_a_link_clears_its_load() {
        let mut l = Link::new("B".into(), "A".into(), Weight::ONE, Volume::new(10));
        l.utilization = Volume::new(5);
        assert_eq!(l.utilization_ratio(), 0.5);
        l.fail();
        assert!(!l.active);
        assert!(l.utilization.is_zero());
        let (lo, hi) = l.endpoints();
        assert_eq!((lo.as_str(), hi.as_str()), ("A", "B"));
    }
}
