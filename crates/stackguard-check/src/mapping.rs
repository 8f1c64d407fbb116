//! Native resource-type to entity-type mapping.
//!
//! The compliance backend classifies cloud resources under its own
//! entity-type vocabulary. This module translates a provider's native
//! resource types (CloudFormation spellings like `AWS::EC2::SecurityGroup`)
//! into that vocabulary through a static table packaged with the crate.
//! The table is loaded once at startup and never reloaded.

use serde::Deserialize;
use stackguard_core::{EntityType, GuardError, Result};
use std::collections::{BTreeSet, HashMap};
use std::io::Read;

/// The packaged mapping table.
///
/// Rows with an empty entity-type column are native types the backend has no
/// equivalent for; they stay in the table so they can be reported as
/// unsupported instead of silently vanishing.
static MAPPING_TABLE: &str = include_str!("native_type_mappings.csv");

#[derive(Debug, Deserialize)]
struct MappingRow {
    #[serde(rename = "NativeType")]
    native_type: String,

    #[serde(rename = "EntityTypes")]
    entity_types: String,
}

/// Immutable native-type to entity-type lookup table.
///
/// Multiple native types may map to the same entity type and one native type
/// may map to several entity types.
#[derive(Debug, Clone)]
pub struct ResourceTypeMapper {
    supported: HashMap<String, Vec<EntityType>>,
    known_unsupported: BTreeSet<String>,
}

impl ResourceTypeMapper {
    /// Load the mapping table packaged with the crate.
    ///
    /// A parse failure here is fatal to every downstream call; there is no
    /// fallback table.
    pub fn embedded() -> Result<Self> {
        Self::from_csv(MAPPING_TABLE.as_bytes())
    }

    /// Load a mapping table from CSV with `NativeType,EntityTypes` columns
    pub fn from_csv(reader: impl Read) -> Result<Self> {
        let mut supported = HashMap::new();
        let mut known_unsupported = BTreeSet::new();

        let mut csv_reader = csv::Reader::from_reader(reader);
        for row in csv_reader.deserialize::<MappingRow>() {
            let row = row.map_err(|e| GuardError::Config(format!("bad mapping table row: {e}")))?;
            let native = row.native_type.trim();
            if native.is_empty() {
                continue;
            }

            let entities: Vec<EntityType> = row
                .entity_types
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(EntityType::from)
                .collect();

            if entities.is_empty() {
                known_unsupported.insert(native.to_string());
            } else {
                supported.insert(native.to_string(), entities);
            }
        }

        if supported.is_empty() {
            return Err(GuardError::Config(
                "mapping table contains no usable rows".to_string(),
            ));
        }

        Ok(Self {
            supported,
            known_unsupported,
        })
    }

    /// Entity types a native type maps to; empty when unknown or unsupported
    #[must_use]
    pub fn map_native_type(&self, native_type: &str) -> &[EntityType] {
        self.supported
            .get(native_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether a native type maps to at least one entity type
    #[must_use]
    pub fn is_recognized(&self, native_type: &str) -> bool {
        self.supported.contains_key(native_type)
    }

    /// Split native types into (supported, unsupported) for reporting.
    ///
    /// Unsupported covers both types the table never heard of and types it
    /// lists with no compliance equivalent.
    pub fn partition<'a>(
        &self,
        native_types: impl IntoIterator<Item = &'a str>,
    ) -> (Vec<&'a str>, Vec<&'a str>) {
        native_types
            .into_iter()
            .partition(|t| self.is_recognized(t))
    }

    /// The set of entity types to wait on for the given native types,
    /// minus the excluded ones
    pub fn relevant_entity_types<'a>(
        &self,
        native_types: impl IntoIterator<Item = &'a str>,
        excluded: &BTreeSet<EntityType>,
    ) -> BTreeSet<EntityType> {
        native_types
            .into_iter()
            .flat_map(|t| self.map_native_type(t).iter().cloned())
            .filter(|e| !excluded.contains(e))
            .collect()
    }

    /// Native types the table lists with no compliance equivalent
    #[must_use]
    pub const fn known_unsupported(&self) -> &BTreeSet<String> {
        &self.known_unsupported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_table_loads() {
        let mapper = ResourceTypeMapper::embedded().unwrap();
        assert_eq!(
            mapper.map_native_type("AWS::EC2::SecurityGroup"),
            &[EntityType::from("SecurityGroup")]
        );
        assert!(mapper.is_recognized("AWS::S3::Bucket"));
        assert!(!mapper.is_recognized("AWS::Imaginary::Widget"));
    }

    #[test]
    fn blank_rows_are_tracked_not_dropped() {
        let mapper = ResourceTypeMapper::embedded().unwrap();
        assert!(mapper.map_native_type("AWS::Logs::LogGroup").is_empty());
        assert!(!mapper.is_recognized("AWS::Logs::LogGroup"));
        assert!(mapper.known_unsupported().contains("AWS::Logs::LogGroup"));
    }

    #[test]
    fn one_native_type_can_map_to_many_entities() {
        let mapper = ResourceTypeMapper::embedded().unwrap();
        let entities = mapper.map_native_type("AWS::AutoScaling::AutoScalingGroup");
        assert_eq!(entities.len(), 2);
        assert!(entities.contains(&EntityType::from("Instance")));
    }

    #[test]
    fn partition_separates_supported_from_unsupported() {
        let mapper = ResourceTypeMapper::embedded().unwrap();
        let (supported, unsupported) = mapper.partition([
            "AWS::EC2::SecurityGroup",
            "AWS::Logs::LogGroup",
            "AWS::Imaginary::Widget",
        ]);
        assert_eq!(supported, vec!["AWS::EC2::SecurityGroup"]);
        assert_eq!(unsupported, vec!["AWS::Logs::LogGroup", "AWS::Imaginary::Widget"]);
    }

    #[test]
    fn relevant_entity_types_dedupes_and_excludes() {
        let mapper = ResourceTypeMapper::embedded().unwrap();
        let excluded: BTreeSet<EntityType> = [EntityType::from("Volume")].into();
        let relevant = mapper.relevant_entity_types(
            ["AWS::EC2::Instance", "AWS::AutoScaling::AutoScalingGroup", "AWS::EC2::Volume"],
            &excluded,
        );
        // Instance appears via two native types but only once here
        assert!(relevant.contains(&EntityType::from("Instance")));
        assert!(relevant.contains(&EntityType::from("AutoScalingGroup")));
        assert!(!relevant.contains(&EntityType::from("Volume")));
    }

    #[test]
    fn malformed_table_is_a_config_error() {
        let err = ResourceTypeMapper::from_csv("NativeType\nAWS::EC2::Instance,Instance".as_bytes())
            .unwrap_err();
        assert!(matches!(err, GuardError::Config(_)));
    }
}
