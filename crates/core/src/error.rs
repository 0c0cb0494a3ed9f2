use crate::context::WidgetId;
use rxform_types::{ConceptId, DrugId};

/// Fatal problems with an element's declarative parameters.
///
/// These abort construction of the form; they are authoring mistakes, not user input errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("drugNames must list at least one valid drug name, id or UUID")]
    MissingDrugNames,
    #[error("no drug found for drug name/id/uuid '{0}'")]
    UnknownDrug(String),
    #[error("drugNames '{0}' does not resolve to any drug")]
    NoDrugsResolved(String),
    #[error("there are a different number of drugLabels ({labels}) than drugs ({drugs})")]
    DrugLabelCountMismatch { labels: usize, drugs: usize },
    #[error("discontinuedReasonConceptId '{0}' is not a valid concept id or concept UUID")]
    UnknownDiscontinuedReasonConcept(String),
    #[error("discontinued reason concept '{0}' does not have any answers")]
    DiscontinuedReasonWithoutAnswers(String),
}

pub type ConfigurationResult<T> = std::result::Result<T, ConfigurationError>;

/// A posted value that a widget could not interpret.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum WidgetError {
    #[error("widget {0} was never registered with the form context")]
    Unregistered(WidgetId),
    #[error("a value is required")]
    Required,
    #[error("'{0}' is not a number")]
    InvalidNumber(String),
    #[error("{value} is outside the allowed range {min}..={max}")]
    NumberOutOfRange { value: f64, min: f64, max: f64 },
    #[error("'{0}' is not a date (expected YYYY-MM-DD)")]
    InvalidDate(String),
}

/// Problems with the compound frequency value.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrequencyError {
    #[error("'{0}' is not a whole number")]
    NotNumeric(String),
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u8,
        min: u8,
        max: u8,
    },
}

/// Failures while turning an already-validated submission into an order.
///
/// Submission trusts validation, so these only surface when the two are called out of order or
/// the posted data was tampered with after validation.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("drug '{0}' is not one of the drugs configured for this field")]
    UnknownDrug(String),
    #[error("discontinued reason '{0}' is not one of the configured answers")]
    UnknownDiscontinuedReason(String),
    #[error("order {order} belongs to patient {owner}, not {patient}")]
    PatientMismatch {
        order: String,
        owner: uuid::Uuid,
        patient: uuid::Uuid,
    },
    #[error("invalid frequency: {0}")]
    Frequency(#[from] FrequencyError),
    #[error("invalid value for {field}: {source}")]
    Widget {
        field: &'static str,
        #[source]
        source: WidgetError,
    },
}

pub type SubmissionResult<T> = std::result::Result<T, SubmissionError>;

/// Failures loading catalogs, form definitions, existing orders and runtime configuration.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to read {path}: {source}", path = path.display())]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("schema mismatch: {0}")]
    Translation(String),
    #[error("drug id {0} appears more than once in the catalog")]
    DuplicateDrug(DrugId),
    #[error("concept id {0} appears more than once in the catalog")]
    DuplicateConcept(ConceptId),
    #[error("concept {concept} lists unknown answer concept {answer}")]
    UnknownAnswer { concept: ConceptId, answer: ConceptId },
}

pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// A form mode name that is not one of `enter`, `edit` or `view`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown form mode '{0}' (expected enter, edit or view)")]
pub struct UnknownMode(pub String);

/// A field name that the drug order element does not have.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown drug order field '{0}'")]
pub struct UnknownField(pub String);
