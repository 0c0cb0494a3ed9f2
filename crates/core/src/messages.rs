//! Localised message lookup.
//!
//! The element never hardcodes user-facing text; it asks a [`MessageSource`] for a message code.
//! Hosts plug in their own bundle. [`EnglishMessages`] is the built-in fallback.

/// Message codes used by the drug order element.
pub mod codes {
    pub const DRUG: &str = "drugOrder.drug";
    pub const DOSE: &str = "drugOrder.dose";
    pub const FREQUENCY: &str = "drugOrder.frequency";
    pub const FREQUENCY_DAY: &str = "drugOrder.frequency.day";
    pub const FREQUENCY_DAYS: &str = "drugOrder.frequency.days";
    pub const FREQUENCY_WEEK: &str = "drugOrder.frequency.week";
    pub const START_DATE: &str = "drugOrder.startDate";
    pub const DISCONTINUED_DATE: &str = "drugOrder.discontinuedDate";
    pub const DISCONTINUED_REASON: &str = "drugOrder.discontinuedReason";

    pub const ERROR_REQUIRED: &str = "drugOrder.error.required";
    pub const ERROR_PLACEHOLDER_SELECTED: &str = "drugOrder.error.cannotChooseADrugHeader";
    pub const ERROR_UNKNOWN_DRUG: &str = "drugOrder.error.unknownDrug";
    pub const ERROR_DOSE_OUT_OF_RANGE: &str = "drugOrder.error.doseOutOfRange";
    pub const ERROR_INVALID_NUMBER: &str = "drugOrder.error.invalidNumber";
    pub const ERROR_INVALID_DATE: &str = "drugOrder.error.invalidDate";
    pub const ERROR_INVALID_CHOICE: &str = "drugOrder.error.invalidChoice";
    pub const ERROR_DISCONTINUED_BEFORE_START: &str =
        "drugOrder.error.discontinuedDateBeforeStartDate";
    pub const ERROR_REASON_WITHOUT_DATE: &str =
        "drugOrder.error.discontinuedReasonEnteredWithoutDate";
}

/// Resolves message codes to display text for the current locale.
pub trait MessageSource: Send + Sync {
    /// Returns the text for `code`. Unknown codes should come back unchanged so a missing
    /// translation is visible rather than silently blank.
    fn message(&self, code: &str) -> String;
}

/// Built-in English bundle.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnglishMessages;

impl MessageSource for EnglishMessages {
    fn message(&self, code: &str) -> String {
        let text = match code {
            codes::DRUG => "Drug",
            codes::DOSE => "Dose",
            codes::FREQUENCY => "Frequency",
            codes::FREQUENCY_DAY => "day",
            codes::FREQUENCY_DAYS => "days",
            codes::FREQUENCY_WEEK => "week",
            codes::START_DATE => "Start Date",
            codes::DISCONTINUED_DATE => "Discontinued Date",
            codes::DISCONTINUED_REASON => "Discontinued Reason",
            codes::ERROR_REQUIRED => "Required",
            codes::ERROR_PLACEHOLDER_SELECTED => "You cannot choose this option, please choose a drug",
            codes::ERROR_UNKNOWN_DRUG => "This drug is not available in this field",
            codes::ERROR_DOSE_OUT_OF_RANGE => "Dose is outside the allowed daily range for this drug",
            codes::ERROR_INVALID_NUMBER => "Please enter a valid number",
            codes::ERROR_INVALID_DATE => "Please enter a valid date (YYYY-MM-DD)",
            codes::ERROR_INVALID_CHOICE => "Please choose one of the listed options",
            codes::ERROR_DISCONTINUED_BEFORE_START => {
                "Discontinued date cannot be before the start date"
            }
            codes::ERROR_REASON_WITHOUT_DATE => {
                "A discontinued reason requires a discontinued date"
            }
            other => return other.to_string(),
        };
        text.to_string()
    }
}
