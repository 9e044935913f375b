use thiserror::Error;

use crate::domain::design::DesignConfiguration;
use crate::domain::garment::{
    field_requirements, Category, FieldRequirements, Silhouette, DEFAULT_NECKLINE,
    DEFAULT_SLEEVE_STYLE,
};
use crate::domain::quote::Appraisal;
use crate::flows::states::{DesignField, WizardStep};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("{field} does not apply to a {category}")]
    FieldNotApplicable { field: &'static str, category: Category },
    #[error("silhouette {silhouette} is not offered for a {category}")]
    SilhouetteNotAllowed { silhouette: Silhouette, category: Category },
    #[error("design is locked while a submission is in flight")]
    SubmissionInFlight,
    #[error("design session already produced an appraisal; reset to start over")]
    SessionComplete,
    #[error("submission is only possible from the final input step, not {step:?}")]
    NotReadyToSubmit { step: WizardStep },
    #[error("no submission is in flight")]
    NoSubmissionInFlight,
}

/// Step cursor plus the evolving design for one wizard session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DesignWizard {
    step: WizardStep,
    config: DesignConfiguration,
    submitting: bool,
    appraisal: Option<Appraisal>,
}

impl Default for DesignWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl DesignWizard {
    pub fn new() -> Self {
        Self {
            step: WizardStep::Basis,
            config: DesignConfiguration::default(),
            submitting: false,
            appraisal: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn config(&self) -> &DesignConfiguration {
        &self.config
    }

    pub fn requirements(&self) -> FieldRequirements {
        field_requirements(self.config.category)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn appraisal(&self) -> Option<&Appraisal> {
        self.appraisal.as_ref()
    }

    /// Moves forward one input step. Never enters the appraisal step; only a
    /// completed submission does that.
    pub fn advance(&mut self) -> WizardStep {
        if self.is_navigable() && self.step < WizardStep::Finalize {
            self.step = WizardStep::from_number(self.step.number() + 1).unwrap_or(self.step);
        }
        self.step
    }

    pub fn retreat(&mut self) -> WizardStep {
        if self.is_navigable() && self.step > WizardStep::Basis {
            self.step = WizardStep::from_number(self.step.number() - 1).unwrap_or(self.step);
        }
        self.step
    }

    pub fn set_category(&mut self, category: Category) -> Result<(), FlowTransitionError> {
        self.ensure_editable()?;

        let requirements = field_requirements(category);
        self.config.category = category;
        self.config.silhouette = requirements.default_silhouette();
        self.config.neckline = requirements.neckline.then_some(DEFAULT_NECKLINE);
        self.config.sleeve_style = requirements.sleeve_style.then_some(DEFAULT_SLEEVE_STYLE);
        Ok(())
    }

    pub fn set_field(&mut self, field: DesignField) -> Result<(), FlowTransitionError> {
        self.ensure_editable()?;

        let requirements = self.requirements();
        let category = self.config.category;
        match field {
            DesignField::Silhouette(silhouette) => {
                if !requirements.allows_silhouette(silhouette) {
                    return Err(FlowTransitionError::SilhouetteNotAllowed { silhouette, category });
                }
                self.config.silhouette = silhouette;
            }
            DesignField::Neckline(neckline) => {
                if !requirements.neckline {
                    return Err(FlowTransitionError::FieldNotApplicable {
                        field: "neckline",
                        category,
                    });
                }
                self.config.neckline = Some(neckline);
            }
            DesignField::SleeveStyle(sleeve_style) => {
                if !requirements.sleeve_style {
                    return Err(FlowTransitionError::FieldNotApplicable {
                        field: "sleeve_style",
                        category,
                    });
                }
                self.config.sleeve_style = Some(sleeve_style);
            }
            DesignField::Length(length) => self.config.length = length,
            DesignField::Notes(notes) => self.config.additional_notes = notes,
            DesignField::FabricSource(source) => {
                // Payloads are source-specific; a stale URL must never be read as base64.
                self.config.fabric_source = source;
                self.config.fabric_data.clear();
            }
            DesignField::FabricData(data) => self.config.fabric_data = data,
        }
        Ok(())
    }

    /// Locks the design and hands out the snapshot the orchestrator works from.
    pub fn begin_submission(&mut self) -> Result<DesignConfiguration, FlowTransitionError> {
        self.ensure_editable()?;
        if self.step != WizardStep::Finalize {
            return Err(FlowTransitionError::NotReadyToSubmit { step: self.step });
        }

        self.submitting = true;
        Ok(self.config.clone())
    }

    pub fn complete_submission(&mut self, appraisal: Appraisal) -> Result<(), FlowTransitionError> {
        if !self.submitting {
            return Err(FlowTransitionError::NoSubmissionInFlight);
        }

        self.submitting = false;
        self.appraisal = Some(appraisal);
        self.step = WizardStep::Appraisal;
        Ok(())
    }

    /// Unlocks the design and returns to the final input step so the user can retry.
    pub fn fail_submission(&mut self) -> Result<(), FlowTransitionError> {
        if !self.submitting {
            return Err(FlowTransitionError::NoSubmissionInFlight);
        }

        self.submitting = false;
        self.appraisal = None;
        self.step = WizardStep::Finalize;
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn is_navigable(&self) -> bool {
        !self.submitting && self.step.is_input_step()
    }

    fn ensure_editable(&self) -> Result<(), FlowTransitionError> {
        if self.submitting {
            return Err(FlowTransitionError::SubmissionInFlight);
        }
        if !self.step.is_input_step() {
            return Err(FlowTransitionError::SessionComplete);
        }
        Ok(())
    }
}
