pub mod engine;
pub mod states;

pub use engine::{DesignWizard, FlowTransitionError};
pub use states::{DesignField, ProgressStage, WizardStep};
