// Wizard description file (TOML)
//
//   name = "Address import"
//
//   [[columns]]
//   name = "Postcode"
//   expression = 'postcode ~ /^[A-Z]{1,2}[0-9]/'
//   expected_type = "postcode"
//   example_value = "SW1A 1AA"
//
// Columns without an expression are trusted and never verified.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use colcheck_core::{Checkpoint, HostError, TableHost, VerificationRequest, WizardColumn};
use colcheck_verify::{Chrome, Wizard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardFileError {
    Io(String),
    Toml(String),
    Invalid(String),
}

impl fmt::Display for WizardFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "cannot read wizard file: {}", msg),
            Self::Toml(msg) => write!(f, "wizard file is not valid TOML: {}", msg),
            Self::Invalid(msg) => write!(f, "invalid wizard file: {}", msg),
        }
    }
}

impl std::error::Error for WizardFileError {}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawWizard {
    name: String,
    #[serde(default)]
    columns: Vec<RawColumn>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawColumn {
    name: String,
    expression: Option<String>,
    expected_type: Option<String>,
    #[serde(default)]
    example_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardFile {
    pub name: String,
    pub columns: Vec<WizardColumn>,
}

impl WizardFile {
    pub fn load(path: &Path) -> Result<Self, WizardFileError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| WizardFileError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, WizardFileError> {
        let raw: RawWizard = toml::from_str(contents).map_err(|e| WizardFileError::Toml(e.to_string()))?;

        if raw.name.trim().is_empty() {
            return Err(WizardFileError::Invalid("name must not be empty".into()));
        }
        if raw.columns.is_empty() {
            return Err(WizardFileError::Invalid("no [[columns]] listed".into()));
        }

        let mut columns: Vec<WizardColumn> = Vec::with_capacity(raw.columns.len());
        for col in raw.columns {
            if col.name.is_empty() {
                return Err(WizardFileError::Invalid("column without a name".into()));
            }
            if columns.iter().any(|c| c.name == col.name) {
                return Err(WizardFileError::Invalid(format!("column '{}' listed twice", col.name)));
            }
            let column = match (col.expression, col.expected_type) {
                (None, None) => WizardColumn::trusted(col.name),
                (Some(expression), Some(expected)) => {
                    WizardColumn::verified(VerificationRequest::new(col.name, expression, expected, col.example_value))
                }
                (Some(_), None) => {
                    return Err(WizardFileError::Invalid(format!(
                        "column '{}' has an expression but no expected_type",
                        col.name
                    )))
                }
                (None, Some(_)) => {
                    return Err(WizardFileError::Invalid(format!(
                        "column '{}' has an expected_type but no expression",
                        col.name
                    )))
                }
            };
            columns.push(column);
        }

        Ok(Self { name: raw.name, columns })
    }

    pub fn verified_count(&self) -> usize {
        self.columns.iter().filter(|c| c.verification.is_some()).count()
    }
}

// ============================================================================
// Wizard driven from the command line
// ============================================================================

/// How a correction session ended for the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Pending,
    Completed,
    Reverted,
}

pub struct CliWizard {
    name: String,
    checkpoint: Checkpoint,
    outcome: Outcome,
}

impl CliWizard {
    /// The wizard's transform has already been applied to the host; undo
    /// returns to the host's current checkpoint.
    pub fn start(name: &str, host: &mut dyn TableHost) -> Result<Self, HostError> {
        let checkpoint = host.latest_checkpoint()?;
        log::debug!("wizard '{}' starts at checkpoint {}", name, checkpoint);
        Ok(Self {
            name: name.to_string(),
            checkpoint,
            outcome: Outcome::Pending,
        })
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }
}

impl Wizard for CliWizard {
    fn name(&self) -> &str {
        &self.name
    }

    fn checkpoint(&self) -> Checkpoint {
        self.checkpoint
    }

    /// The wizard file describes a transform that was applied before
    /// `colcheck` ran; there is nothing to recompute here.
    fn rerun(&mut self, _host: &mut dyn TableHost) -> Result<(), HostError> {
        log::debug!("wizard '{}': transform already applied, nothing to re-run", self.name);
        Ok(())
    }

    fn set_chrome(&mut self, chrome: Chrome) {
        log::debug!("wizard '{}': {:?} controls", self.name, chrome);
    }

    fn complete(&mut self) {
        self.outcome = Outcome::Completed;
    }

    fn reverted(&mut self) {
        self.outcome = Outcome::Reverted;
    }
}
