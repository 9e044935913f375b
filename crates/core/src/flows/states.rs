use serde::{Deserialize, Serialize};

use crate::domain::design::FabricSourceType;
use crate::domain::garment::{Length, Neckline, Silhouette, SleeveStyle};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WizardStep {
    Basis,
    Shape,
    Artisan,
    Textile,
    Finalize,
    Appraisal,
}

impl WizardStep {
    pub const INPUT_STEPS: &'static [WizardStep] =
        &[Self::Basis, Self::Shape, Self::Artisan, Self::Textile, Self::Finalize];

    pub fn number(self) -> u8 {
        match self {
            Self::Basis => 1,
            Self::Shape => 2,
            Self::Artisan => 3,
            Self::Textile => 4,
            Self::Finalize => 5,
            Self::Appraisal => 6,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::Basis),
            2 => Some(Self::Shape),
            3 => Some(Self::Artisan),
            4 => Some(Self::Textile),
            5 => Some(Self::Finalize),
            6 => Some(Self::Appraisal),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Basis => "Basis",
            Self::Shape => "Shape",
            Self::Artisan => "Artisan",
            Self::Textile => "Textile",
            Self::Finalize => "Finalize",
            Self::Appraisal => "Appraisal",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Basis => "Define the Base",
            Self::Shape => "Sculpt the Silhouette",
            Self::Artisan => "Artisan Detailing",
            Self::Textile => "Curate Materials",
            Self::Finalize => "Tailoring Notes",
            Self::Appraisal => "Official Artisan Appraisal",
        }
    }

    pub fn is_input_step(self) -> bool {
        self != Self::Appraisal
    }
}

/// A single-field write. Category changes go through
/// [`crate::flows::DesignWizard::set_category`] because they cascade.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DesignField {
    Silhouette(Silhouette),
    Neckline(Neckline),
    SleeveStyle(SleeveStyle),
    Length(Length),
    Notes(String),
    FabricSource(FabricSourceType),
    FabricData(String),
}

impl DesignField {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Silhouette(_) => "silhouette",
            Self::Neckline(_) => "neckline",
            Self::SleeveStyle(_) => "sleeve_style",
            Self::Length(_) => "length",
            Self::Notes(_) => "additional_notes",
            Self::FabricSource(_) => "fabric_source",
            Self::FabricData(_) => "fabric_data",
        }
    }
}

/// Cosmetic status line shown while a submission is pending.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgressStage(usize);

const PROGRESS_MESSAGES: [&str; 5] = [
    "Consulting master tailors...",
    "Drafting digital patterns...",
    "Analyzing textile drape...",
    "Calculating manual bench hours...",
    "Finalizing artisan appraisal...",
];

impl ProgressStage {
    pub const COUNT: usize = PROGRESS_MESSAGES.len();

    pub fn index(self) -> usize {
        self.0
    }

    pub fn message(self) -> &'static str {
        PROGRESS_MESSAGES[self.0 % Self::COUNT]
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self((self.0 + 1) % Self::COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::{ProgressStage, WizardStep};

    #[test]
    fn step_numbers_round_trip() {
        for number in 1..=6 {
            let step = WizardStep::from_number(number).expect("steps 1..=6 exist");
            assert_eq!(step.number(), number);
        }
        assert_eq!(WizardStep::from_number(0), None);
        assert_eq!(WizardStep::from_number(7), None);
    }

    #[test]
    fn only_the_appraisal_step_is_terminal() {
        assert_eq!(WizardStep::INPUT_STEPS.len(), 5);
        assert!(WizardStep::INPUT_STEPS.iter().all(|step| step.is_input_step()));
        assert!(!WizardStep::Appraisal.is_input_step());
    }

    #[test]
    fn progress_stage_cycles_through_every_message() {
        let mut stage = ProgressStage::default();
        assert_eq!(stage.message(), "Consulting master tailors...");
        for _ in 0..ProgressStage::COUNT {
            stage = stage.next();
        }
        assert_eq!(stage, ProgressStage::default());
        assert_eq!(stage.next().message(), "Drafting digital patterns...");
    }
}
