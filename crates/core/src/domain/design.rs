use serde::{Deserialize, Serialize};

use crate::domain::garment::{
    field_requirements, Category, FieldRequirements, Length, Neckline, Silhouette, SleeveStyle,
    UnknownOption, DEFAULT_LENGTH, DEFAULT_NECKLINE, DEFAULT_SLEEVE_STYLE,
};
use crate::domain::image::InlineImage;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FabricSourceType {
    #[default]
    Description,
    Link,
    Upload,
}

impl FabricSourceType {
    pub const ALL: &'static [FabricSourceType] = &[Self::Description, Self::Link, Self::Upload];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::Link => "link",
            Self::Upload => "upload",
        }
    }
}

impl std::fmt::Display for FabricSourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FabricSourceType {
    type Err = UnknownOption;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "description" | "text" => Ok(Self::Description),
            "link" | "url" => Ok(Self::Link),
            "upload" | "image" => Ok(Self::Upload),
            _ => Err(UnknownOption { kind: "fabric source", value: value.to_string() }),
        }
    }
}

/// The garment specification a wizard session builds up.
///
/// Field-level invariants (silhouette membership, neckline and sleeve relevance)
/// are enforced by [`crate::flows::DesignWizard`]; this type is the plain data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignConfiguration {
    pub category: Category,
    pub silhouette: Silhouette,
    pub neckline: Option<Neckline>,
    pub sleeve_style: Option<SleeveStyle>,
    pub length: Length,
    #[serde(rename = "fabricSourceType")]
    pub fabric_source: FabricSourceType,
    pub fabric_data: String,
    pub additional_notes: String,
}

impl Default for DesignConfiguration {
    fn default() -> Self {
        let category = Category::Dress;
        Self {
            category,
            silhouette: category.default_silhouette(),
            neckline: Some(DEFAULT_NECKLINE),
            sleeve_style: Some(DEFAULT_SLEEVE_STYLE),
            length: DEFAULT_LENGTH,
            fabric_source: FabricSourceType::Description,
            fabric_data: String::new(),
            additional_notes: String::new(),
        }
    }
}

impl DesignConfiguration {
    pub fn requirements(&self) -> FieldRequirements {
        field_requirements(self.category)
    }

    pub fn is_upper_garment(&self) -> bool {
        self.category.is_upper_garment()
    }

    /// Copy with every attribute the category does not expose masked out.
    pub fn normalized(&self) -> Self {
        let requirements = self.requirements();
        let mut normalized = self.clone();
        if !requirements.allows_silhouette(normalized.silhouette) {
            normalized.silhouette = requirements.default_silhouette();
        }
        if !requirements.neckline {
            normalized.neckline = None;
        }
        if !requirements.sleeve_style {
            normalized.sleeve_style = None;
        }
        normalized
    }

    pub fn notes(&self) -> Option<&str> {
        let notes = self.additional_notes.trim();
        (!notes.is_empty()).then_some(notes)
    }

    pub fn fabric_text(&self) -> Option<&str> {
        let data = self.fabric_data.trim();
        (!data.is_empty()).then_some(data)
    }

    /// Swatch payload for upload sources; `Ok(None)` for the other source types.
    pub fn upload_image(&self) -> Result<Option<InlineImage>, DomainError> {
        if self.fabric_source != FabricSourceType::Upload {
            return Ok(None);
        }

        InlineImage::from_data_url(&self.fabric_data).map(Some).ok_or_else(|| {
            DomainError::InvariantViolation(
                "fabric source is `upload` but no image payload was provided".to_string(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::garment::{Category, Neckline, Silhouette, SleeveStyle};

    use super::{DesignConfiguration, FabricSourceType};

    #[test]
    fn default_configuration_is_a_floor_length_a_line_dress() {
        let config = DesignConfiguration::default();
        assert_eq!(config.category, Category::Dress);
        assert_eq!(config.silhouette, Silhouette::ALine);
        assert_eq!(config.neckline, Some(Neckline::VNeck));
        assert_eq!(config.sleeve_style, Some(SleeveStyle::Sleeveless));
        assert_eq!(config.fabric_source, FabricSourceType::Description);
        assert!(config.fabric_data.is_empty());
    }

    #[test]
    fn normalized_masks_upper_body_fields_for_lower_garments() {
        let config = DesignConfiguration {
            category: Category::Skirt,
            silhouette: Silhouette::ALine,
            ..DesignConfiguration::default()
        };

        let normalized = config.normalized();
        assert_eq!(normalized.silhouette, Silhouette::Pencil);
        assert_eq!(normalized.neckline, None);
        assert_eq!(normalized.sleeve_style, None);
    }

    #[test]
    fn upload_without_payload_is_an_invariant_violation() {
        let config = DesignConfiguration {
            fabric_source: FabricSourceType::Upload,
            ..DesignConfiguration::default()
        };
        assert!(config.upload_image().is_err());

        let described = DesignConfiguration::default();
        assert_eq!(described.upload_image(), Ok(None));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(DesignConfiguration::default()).expect("serialize");
        assert_eq!(json["sleeveStyle"], "Sleeveless");
        assert_eq!(json["fabricSourceType"], "description");
        assert!(json.get("fabricSource").is_none());
        assert_eq!(json["additionalNotes"], "");
    }
}
