//! Instance metadata document returned by the compute endpoint.

use serde::{Deserialize, Deserializer, Serialize};

use super::field::InstanceField;

/// Snapshot of the instance attributes the stage can attach as tags.
///
/// Every attribute is optional on the wire; absent or `null` attributes are
/// represented as empty strings. Unknown keys are ignored, the endpoint
/// returns many more attributes than the stage uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstanceDocument {
    #[serde(deserialize_with = "nullable_string")]
    pub az_environment: String,
    #[serde(deserialize_with = "nullable_string")]
    pub location: String,
    #[serde(deserialize_with = "nullable_string")]
    pub placement_group_id: String,
    #[serde(deserialize_with = "nullable_string")]
    pub resource_group_name: String,
    #[serde(deserialize_with = "nullable_string")]
    pub resource_id: String,
    #[serde(deserialize_with = "nullable_string")]
    pub subscription_id: String,
    #[serde(deserialize_with = "nullable_string")]
    pub version: String,
    #[serde(deserialize_with = "nullable_string")]
    pub vm_id: String,
    #[serde(deserialize_with = "nullable_string")]
    pub zone: String,
}

impl InstanceDocument {
    /// Value of `field`, empty when the endpoint did not report it.
    pub fn get(&self, field: InstanceField) -> &str {
        match field {
            InstanceField::AzEnvironment => &self.az_environment,
            InstanceField::Location => &self.location,
            InstanceField::PlacementGroupId => &self.placement_group_id,
            InstanceField::ResourceGroupName => &self.resource_group_name,
            InstanceField::ResourceId => &self.resource_id,
            InstanceField::SubscriptionId => &self.subscription_id,
            InstanceField::Version => &self.version,
            InstanceField::VmId => &self.vm_id,
            InstanceField::Zone => &self.zone,
        }
    }
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_compute_document() {
        let body = r#"{
            "azEnvironment": "AzurePublicCloud",
            "location": "eastus",
            "placementGroupId": "",
            "resourceGroupName": "rg-metrics",
            "resourceId": "/subscriptions/sub/resourceGroups/rg-metrics/providers/Microsoft.Compute/virtualMachines/vm1",
            "subscriptionId": "8d10da13-8125-4ba9-a717-bf7490507b3d",
            "version": "20.04.202105150",
            "vmId": "02aab8a4-74ef-476e-8182-f6d2ba4166a6",
            "zone": "1",
            "osType": "Linux",
            "tagsList": []
        }"#;

        let doc: InstanceDocument = serde_json::from_str(body).unwrap();
        assert_eq!(doc.get(InstanceField::Location), "eastus");
        assert_eq!(doc.get(InstanceField::Zone), "1");
        assert_eq!(doc.get(InstanceField::VmId), "02aab8a4-74ef-476e-8182-f6d2ba4166a6");
        assert_eq!(doc.get(InstanceField::PlacementGroupId), "");
    }

    #[test]
    fn test_missing_and_null_attributes_are_empty() {
        let doc: InstanceDocument =
            serde_json::from_str(r#"{"location":"westeurope","zone":null}"#).unwrap();
        assert_eq!(doc.location, "westeurope");
        assert_eq!(doc.zone, "");
        assert_eq!(doc.subscription_id, "");
    }

    #[test]
    fn test_non_string_attribute_is_rejected() {
        let result = serde_json::from_str::<InstanceDocument>(r#"{"zone":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_every_field_maps_to_document() {
        let doc = InstanceDocument {
            az_environment: "a".into(),
            location: "b".into(),
            placement_group_id: "c".into(),
            resource_group_name: "d".into(),
            resource_id: "e".into(),
            subscription_id: "f".into(),
            version: "g".into(),
            vm_id: "h".into(),
            zone: "i".into(),
        };
        let values: Vec<&str> = InstanceField::ALL.iter().map(|f| doc.get(*f)).collect();
        assert_eq!(values, vec!["a", "b", "c", "d", "e", "f", "g", "h", "i"]);
    }
}
