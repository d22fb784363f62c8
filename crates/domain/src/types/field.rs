//! Instance attribute names and the validated set configured for a stage.

use std::collections::BTreeSet;

use crate::errors::{Result, TaggerError};
use crate::impl_field_name_conversions;

/// An instance attribute that may be attached as a tag.
///
/// This enum is the allow-list: configuration naming anything else is
/// rejected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InstanceField {
    AzEnvironment,
    Location,
    PlacementGroupId,
    ResourceGroupName,
    ResourceId,
    SubscriptionId,
    Version,
    VmId,
    Zone,
}

impl_field_name_conversions!(InstanceField {
    AzEnvironment => "azEnvironment",
    Location => "location",
    PlacementGroupId => "placementGroupId",
    ResourceGroupName => "resourceGroupName",
    ResourceId => "resourceId",
    SubscriptionId => "subscriptionId",
    Version => "version",
    VmId => "vmid",
    Zone => "zone",
});

/// Non-empty, duplicate-free set of allow-listed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet(BTreeSet<InstanceField>);

impl FieldSet {
    /// Validate configured field names against the allow-list.
    ///
    /// # Errors
    /// Returns `TaggerError::Config` if no names are given, or if any name is
    /// empty or not allow-listed.
    pub fn parse<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut fields = BTreeSet::new();
        for name in names {
            let name = name.as_ref();
            let field = name.parse::<InstanceField>().map_err(|_| {
                TaggerError::Config(format!(
                    "not allowed metadata tag specified in configuration: {name:?}"
                ))
            })?;
            fields.insert(field);
        }

        if fields.is_empty() {
            return Err(TaggerError::Config("no tags specified in configuration".into()));
        }

        Ok(Self(fields))
    }

    pub fn iter(&self) -> impl Iterator<Item = InstanceField> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a validated set; provided for API completeness.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: InstanceField) -> bool {
        self.0.contains(&field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_allowed_fields() {
        let set = FieldSet::parse(["location", "zone"]).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(InstanceField::Location));
        assert!(set.contains(InstanceField::Zone));
    }

    #[test]
    fn test_parse_deduplicates() {
        let set = FieldSet::parse(["zone", "location", "zone"]).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_parse_every_allow_listed_name() {
        let names: Vec<&str> = InstanceField::ALL.iter().map(InstanceField::as_str).collect();
        let set = FieldSet::parse(&names).unwrap();
        assert_eq!(set.len(), 9);
    }

    #[test]
    fn test_parse_rejects_empty_list() {
        let err = FieldSet::parse(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, TaggerError::Config(_)));
    }

    #[test]
    fn test_parse_rejects_unknown_name() {
        let err = FieldSet::parse(["location", "hostname"]).unwrap_err();
        assert!(matches!(err, TaggerError::Config(ref msg) if msg.contains("hostname")));
    }

    #[test]
    fn test_parse_rejects_empty_name() {
        assert!(FieldSet::parse([""]).is_err());
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!(FieldSet::parse(["vmId"]).is_err());
        assert!(FieldSet::parse(["vmid"]).is_ok());
    }
}
