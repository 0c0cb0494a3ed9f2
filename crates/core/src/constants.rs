//! Constants used throughout the rxform core crate.
//!
//! Parameter keys are the attribute names a form author writes on the drug order tag; they are
//! part of the authoring contract and must not change.

/// Required. Comma-separated drug names, numeric ids, UUIDs or `/label/` placeholders.
pub const PARAM_DRUG_NAMES: &str = "drugNames";

/// Optional. Comma-separated display labels, one per resolved drug.
pub const PARAM_DRUG_LABELS: &str = "drugLabels";

/// Optional flag. Hides the dose and both frequency selectors.
pub const PARAM_HIDE_DOSE_AND_FREQUENCY: &str = "hideDoseAndFrequency";

/// Optional flag. Renders a single configured drug as a checkbox.
pub const PARAM_CHECKBOX: &str = "checkbox";

/// Optional flag. Checks the dose against the drug's minimum/maximum daily dose.
pub const PARAM_VALIDATE_DOSE: &str = "validateDose";

/// Optional. Label of the free-text instructions field; the field only exists when set.
pub const PARAM_INSTRUCTIONS_LABEL: &str = "instructionsLabel";

/// Optional. Concept id or UUID whose answers become the discontinuation reasons.
pub const PARAM_DISCONTINUED_REASON: &str = "discontinuedReasonConceptId";

/// Selector value posted for a placeholder choice.
pub const PLACEHOLDER_VALUE: &str = "~";

/// Bounds of the dose number field.
pub const DOSE_MIN: f64 = 0.0;
pub const DOSE_MAX: f64 = 9_999_999.0;

/// Posted date format for date widgets.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Default listen address of the HTTP host.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
