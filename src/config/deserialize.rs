// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Validates service names and requires a non-empty service list.

use nonempty::NonEmpty;
use serde::Deserialize;

use crate::types::ServiceName;

pub fn deserialize_services<'de, D>(deserializer: D) -> Result<NonEmpty<ServiceName>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let names = deserialize_service_list(deserializer)?;
    NonEmpty::from_vec(names)
        .ok_or_else(|| serde::de::Error::custom("at least one service is required"))
}

pub fn deserialize_service_list<'de, D>(deserializer: D) -> Result<Vec<ServiceName>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<String> = Vec::deserialize(deserializer)?;
    values
        .iter()
        .map(|s| ServiceName::new(s))
        .collect::<Result<Vec<_>, _>>()
        .map_err(serde::de::Error::custom)
}
