//! Key-space layout and primitive value encodings.
//!
//! One string key per persisted concept. Counter and pointer values are
//! stored as ASCII decimal so the key-space stays inspectable with any
//! generic client; list- and map-shaped blobs go through
//! [`worldstore_codec`].

use crate::error::{CoreError, CoreResult};
use crate::types::{ArchetypeId, ComponentTypeId, EntityId};

/// Key holding one entity's value for one component type.
pub(crate) fn component_value_key(type_id: ComponentTypeId, entity: EntityId) -> String {
    format!(
        "COMPONENT-VALUE:TYPE-{}:ENTITY-{}",
        type_id.as_u32(),
        entity.as_u64()
    )
}

/// Key holding the lowest entity ID not yet assigned.
pub(crate) fn next_entity_id_key() -> &'static str {
    "NEXT-ENTITY-ID"
}

/// Key holding the archetype ID an entity currently belongs to.
pub(crate) fn entity_archetype_key(entity: EntityId) -> String {
    format!("ARCHETYPE-ID:ENTITY-ID-{}", entity.as_u64())
}

/// Key holding the encoded list of entity IDs active in an archetype.
pub(crate) fn active_entities_key(archetype: ArchetypeId) -> String {
    format!("ACTIVE-ENTITY-IDS:ARCHETYPE-ID-{}", archetype.as_i64())
}

/// Key holding the encoded archetype ID to component types mapping.
pub(crate) fn archetype_map_key() -> &'static str {
    "ARCHETYPE-ID-TO-COMPONENT-TYPES"
}

/// Formats an unsigned counter for storage.
pub(crate) fn format_u64(value: u64) -> Vec<u8> {
    value.to_string().into_bytes()
}

/// Formats a signed archetype pointer for storage.
pub(crate) fn format_i64(value: i64) -> Vec<u8> {
    value.to_string().into_bytes()
}

/// Parses an unsigned counter read back from storage.
pub(crate) fn parse_u64(bytes: &[u8]) -> CoreResult<u64> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| CoreError::invalid_format("counter is not valid UTF-8"))?;
    text.parse::<u64>()
        .map_err(|_| CoreError::invalid_format(format!("counter {text:?} is not an unsigned integer")))
}

/// Parses a signed archetype pointer read back from storage.
pub(crate) fn parse_i64(bytes: &[u8]) -> CoreResult<i64> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| CoreError::invalid_format("archetype pointer is not valid UTF-8"))?;
    text.parse::<i64>()
        .map_err(|_| CoreError::invalid_format(format!("archetype pointer {text:?} is not an integer")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_shapes() {
        assert_eq!(
            component_value_key(ComponentTypeId::new(3), EntityId::new(12)),
            "COMPONENT-VALUE:TYPE-3:ENTITY-12"
        );
        assert_eq!(
            entity_archetype_key(EntityId::new(9)),
            "ARCHETYPE-ID:ENTITY-ID-9"
        );
        assert_eq!(
            active_entities_key(ArchetypeId::new(4)),
            "ACTIVE-ENTITY-IDS:ARCHETYPE-ID-4"
        );
        assert_eq!(next_entity_id_key(), "NEXT-ENTITY-ID");
        assert_eq!(archetype_map_key(), "ARCHETYPE-ID-TO-COMPONENT-TYPES");
    }

    #[test]
    fn decimal_roundtrip() {
        assert_eq!(parse_u64(&format_u64(0)).unwrap(), 0);
        assert_eq!(parse_u64(&format_u64(u64::MAX)).unwrap(), u64::MAX);
        assert_eq!(parse_i64(&format_i64(-1)).unwrap(), -1);
        assert_eq!(parse_i64(&format_i64(17)).unwrap(), 17);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_u64(b"not a number").is_err());
        assert!(parse_u64(&[0xff, 0xfe]).is_err());
        assert!(parse_i64(b"12.5").is_err());
    }
}
