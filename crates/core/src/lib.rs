//! # rxform Core
//!
//! Core logic of the drug order form element.
//!
//! This crate contains the element and everything it needs to run end to end:
//! - Configuration of the element from the author's parameters against a drug/concept catalog
//! - Widget registration, rendering for ENTER/EDIT/VIEW and parsing of posted values
//! - Binding to a patient's existing orders when a saved encounter is re-opened
//! - Validation of posted values and the create/update/void submission state machine
//!
//! **No transport concerns**: HTTP serving and the command line live in the `rxform-run` and
//! `rxform-cli` binaries.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod context;
pub mod element;
pub mod error;
pub mod frequency;
pub mod messages;
pub mod order;
pub mod session;
pub mod widget;

pub use catalog::{Concept, ConceptService, Drug, InMemoryCatalog};
pub use config::{CoreConfig, FormDefinition};
pub use context::{FieldError, FormContext, Mode, Submission, WidgetId};
pub use element::{
    DrugCatalogEntry, DrugOrderElement, DrugSelection, DrugSelector, FieldConfiguration,
    FieldKind, SelectorChoice, SelectorStyle, SubmissionOutcome,
};
pub use error::{
    ConfigurationError, ConfigurationResult, FrequencyError, LoadError, LoadResult,
    SubmissionError, SubmissionResult, UnknownField, UnknownMode, WidgetError,
};
pub use frequency::Frequency;
pub use messages::{EnglishMessages, MessageSource};
pub use order::{DrugOrder, Encounter, ExistingOrderPool, OrderType};
pub use session::FormSession;
