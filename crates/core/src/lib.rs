pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;

pub use domain::design::{DesignConfiguration, FabricSourceType};
pub use domain::garment::{
    field_requirements, is_upper_garment, Category, FieldRequirements, Length, Neckline,
    Silhouette, SleeveStyle, UnknownOption,
};
pub use domain::image::InlineImage;
pub use domain::quote::{Appraisal, Complexity, QuoteResult, SourceCitation};
pub use errors::{ApplicationError, DomainError, InterfaceError, SUBMISSION_FAILED_MESSAGE};
pub use flows::{DesignField, DesignWizard, FlowTransitionError, ProgressStage, WizardStep};
