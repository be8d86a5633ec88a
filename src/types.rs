//! Core identifier types shared by the host interface and the compensator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Action type identifier (not an instance), stable across sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub u32);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "action#{}", self.0)
    }
}

/// Host-side actor identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Correlation token the host issues per outstanding action
///
/// Unique only while the action is outstanding; the host reuses tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceToken(pub u16);

impl fmt::Display for SequenceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seq#{}", self.0)
    }
}

/// Direction of a host network message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkDirection {
    /// Client to server
    Outbound,
    /// Server to client
    Inbound,
}

impl std::str::FromStr for NetworkDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "outbound" | "up" | "zoneup" => Ok(Self::Outbound),
            "inbound" | "down" | "zonedown" => Ok(Self::Inbound),
            _ => Err(format!("Unknown network direction: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_from_str() {
        assert_eq!(
            "outbound".parse::<NetworkDirection>().unwrap(),
            NetworkDirection::Outbound
        );
        assert_eq!(
            "ZoneUp".parse::<NetworkDirection>().unwrap(),
            NetworkDirection::Outbound
        );
        assert_eq!(
            "down".parse::<NetworkDirection>().unwrap(),
            NetworkDirection::Inbound
        );
        assert!("sideways".parse::<NetworkDirection>().is_err());
    }

    #[test]
    fn test_action_id_as_json_map_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(ActionId(7), 0.6f32);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"7":0.6}"#);

        let back: std::collections::BTreeMap<ActionId, f32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(&ActionId(7)), Some(&0.6));
    }
}
