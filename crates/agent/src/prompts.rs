use atelier_core::{DesignConfiguration, FabricSourceType, InlineImage};

use crate::error::GenerationError;

pub const PREVIEW_ASPECT_RATIO: &str = "3:4";
pub const PRICE_RANGE_HINT: &str = "$200 - $8,000";

const NOT_APPLICABLE: &str = "Not applicable";

/// Everything the analysis call needs, already derived from the design.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub prompt: String,
    /// Fabric swatch sent alongside the prompt for upload sources.
    pub swatch: Option<InlineImage>,
    /// Ask the service to ground its fabric analysis in a web search.
    pub grounded: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub aspect_ratio: &'static str,
}

pub fn build_analysis_request(
    design: &DesignConfiguration,
) -> Result<AnalysisRequest, GenerationError> {
    let design = design.normalized();
    let swatch = design.upload_image()?;

    let fabric_details = match design.fabric_source {
        FabricSourceType::Upload => "Image provided".to_string(),
        FabricSourceType::Description | FabricSourceType::Link => {
            design.fabric_text().unwrap_or("Not specified").to_string()
        }
    };
    let neckline = design.neckline.map(|value| value.label()).unwrap_or(NOT_APPLICABLE);
    let sleeve_style = design.sleeve_style.map(|value| value.label()).unwrap_or(NOT_APPLICABLE);
    let notes = design.notes().unwrap_or("Standard construction");

    let prompt = format!(
        "As a high-end bespoke tailor and fashion expert at a couture atelier, analyze this custom {category} design.\n\
         \n\
         Specifications:\n\
         - Item Type: {category}\n\
         - Silhouette: {silhouette}\n\
         - Neckline: {neckline}\n\
         - Sleeve Style: {sleeve_style}\n\
         - Length: {length}\n\
         - Fabric Source: {source}\n\
         - Fabric Details: {fabric_details}\n\
         - Notes: {notes}\n\
         \n\
         Analyze complexity and provide a quote reflecting premium bespoke standards ({PRICE_RANGE_HINT} range).",
        category = design.category,
        silhouette = design.silhouette,
        length = design.length,
        source = design.fabric_source,
    );

    Ok(AnalysisRequest {
        prompt,
        swatch,
        grounded: design.fabric_source == FabricSourceType::Link,
    })
}

pub fn build_image_request(design: &DesignConfiguration) -> ImageRequest {
    let design = design.normalized();

    let detailing = match (design.neckline, design.sleeve_style) {
        (Some(neckline), Some(sleeves)) => format!(" Neckline: {neckline}, Sleeves: {sleeves}."),
        (Some(neckline), None) => format!(" Neckline: {neckline}."),
        (None, Some(sleeves)) => format!(" Sleeves: {sleeves}."),
        (None, None) => String::new(),
    };

    let prompt = format!(
        "A professional high-fashion illustration of a custom {category}. \
         Silhouette: {silhouette}.{detailing} \
         Length: {length}. \
         Style: Minimalist boutique concept art, high-end fabric texture, white studio background.",
        category = design.category,
        silhouette = design.silhouette,
        length = design.length,
    );

    ImageRequest { prompt, aspect_ratio: PREVIEW_ASPECT_RATIO }
}

#[cfg(test)]
mod tests {
    use atelier_core::{
        Category, DesignConfiguration, FabricSourceType, Length, Neckline, Silhouette, SleeveStyle,
    };

    use super::{build_analysis_request, build_image_request};
    use crate::error::GenerationError;

    fn silk_dress() -> DesignConfiguration {
        DesignConfiguration {
            category: Category::Dress,
            silhouette: Silhouette::ALine,
            neckline: Some(Neckline::VNeck),
            sleeve_style: Some(SleeveStyle::Sleeveless),
            length: Length::FloorLength,
            fabric_source: FabricSourceType::Description,
            fabric_data: "silk".to_string(),
            additional_notes: String::new(),
        }
    }

    #[test]
    fn analysis_prompt_lists_every_garment_choice() {
        let request = build_analysis_request(&silk_dress()).expect("request");
        for expected in [
            "- Item Type: Dress",
            "- Silhouette: A-Line",
            "- Neckline: V-Neck",
            "- Sleeve Style: Sleeveless",
            "- Length: Floor-Length",
            "- Fabric Source: description",
            "- Fabric Details: silk",
            "- Notes: Standard construction",
            "$200 - $8,000",
        ] {
            assert!(request.prompt.contains(expected), "prompt missing `{expected}`");
        }
        assert!(!request.grounded);
        assert!(request.swatch.is_none());
    }

    #[test]
    fn link_sources_request_grounding() {
        let design = DesignConfiguration {
            fabric_source: FabricSourceType::Link,
            fabric_data: "https://www.moodfabrics.com/silk-charmeuse".to_string(),
            ..silk_dress()
        };
        let request = build_analysis_request(&design).expect("request");
        assert!(request.grounded);
        assert!(request.prompt.contains("https://www.moodfabrics.com/silk-charmeuse"));
    }

    #[test]
    fn upload_sources_send_the_swatch_instead_of_text() {
        let design = DesignConfiguration {
            fabric_source: FabricSourceType::Upload,
            fabric_data: "data:image/png;base64,c3dhdGNo".to_string(),
            ..silk_dress()
        };
        let request = build_analysis_request(&design).expect("request");
        let swatch = request.swatch.expect("swatch attached");
        assert_eq!(swatch.mime_type, "image/png");
        assert_eq!(swatch.data, "c3dhdGNo");
        assert!(request.prompt.contains("- Fabric Details: Image provided"));
        assert!(!request.prompt.contains("c3dhdGNo"));
    }

    #[test]
    fn upload_without_payload_is_rejected() {
        let design = DesignConfiguration {
            fabric_source: FabricSourceType::Upload,
            fabric_data: String::new(),
            ..silk_dress()
        };
        let error = build_analysis_request(&design).expect_err("missing swatch");
        assert!(matches!(error, GenerationError::InvalidPayload(_)));
    }

    #[test]
    fn lower_garments_omit_upper_body_detailing() {
        let design = DesignConfiguration {
            category: Category::Pants,
            silhouette: Silhouette::WideLeg,
            neckline: None,
            sleeve_style: None,
            length: Length::Ankle,
            ..silk_dress()
        };

        let analysis = build_analysis_request(&design).expect("request");
        assert!(analysis.prompt.contains("- Neckline: Not applicable"));

        let image = build_image_request(&design);
        assert!(!image.prompt.contains("Neckline"));
        assert!(!image.prompt.contains("Sleeves"));
        assert!(image.prompt.contains("custom Pants"));
        assert!(image.prompt.contains("Length: Ankle."));
    }

    #[test]
    fn image_prompt_includes_detailing_for_upper_garments() {
        let image = build_image_request(&silk_dress());
        assert!(image
            .prompt
            .contains("Silhouette: A-Line. Neckline: V-Neck, Sleeves: Sleeveless."));
        assert_eq!(image.aspect_ratio, "3:4");
    }
}
