//! The drug order form element.
//!
//! One [`DrugOrderElement`] is built per form instantiation. Construction parses the author's
//! parameters into a [`FieldConfiguration`], registers the element's widgets with the
//! [`FormContext`] and, when re-opening a saved encounter, claims a matching existing order from
//! the context's pool. After that the element renders any number of times, and each post runs
//! [`DrugOrderElement::validate_submission`] followed by [`DrugOrderElement::handle_submission`].

mod bind;
mod configure;
mod render;
mod submit;
mod validate;

pub use configure::{DiscontinuedReasonConfig, FieldConfiguration};

use crate::catalog::{ConceptService, Drug};
use crate::constants::PLACEHOLDER_VALUE;
use crate::context::{FormContext, Submission, WidgetId};
use crate::error::{ConfigurationResult, UnknownField, WidgetError};
use crate::order::DrugOrder;
use crate::widget::{
    CheckboxWidget, DateWidget, DropdownWidget, NumberFieldWidget, SelectOption, TextFieldWidget,
    Widget, WidgetBinding,
};
use rxform_types::DrugId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A drug the author made selectable, with its display label.
#[derive(Clone, Debug, PartialEq)]
pub struct DrugCatalogEntry {
    pub drug: Drug,
    pub label: String,
    /// Index among the configured drugs (placeholders excluded).
    pub position: usize,
}

/// One option of the drug dropdown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectorChoice {
    Blank,
    Drug { id: DrugId, label: String },
    /// Non-selectable heading written as `/label/` in the drug list.
    Placeholder { label: String },
}

impl SelectorChoice {
    pub fn to_option(&self) -> SelectOption {
        match self {
            SelectorChoice::Blank => SelectOption::new("", ""),
            SelectorChoice::Drug { id, label } => SelectOption::new(label.clone(), id.to_string()),
            SelectorChoice::Placeholder { label } => {
                SelectOption::new(format!("[ {label} ]"), PLACEHOLDER_VALUE)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectorStyle {
    Checkbox,
    Dropdown,
}

/// What the user picked in the drug selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrugSelection {
    Nothing,
    Placeholder,
    Drug(String),
}

impl DrugSelection {
    pub fn from_posted(value: Option<String>) -> Self {
        match value.as_deref().map(str::trim) {
            None | Some("") => DrugSelection::Nothing,
            Some(PLACEHOLDER_VALUE) => DrugSelection::Placeholder,
            Some(id) => DrugSelection::Drug(id.to_string()),
        }
    }
}

/// The drug input, fixed at construction.
#[derive(Clone, Debug)]
pub enum DrugSelector {
    Checkbox(WidgetBinding<CheckboxWidget>),
    Dropdown(WidgetBinding<DropdownWidget>),
}

impl DrugSelector {
    fn widget_id(&self) -> WidgetId {
        match self {
            DrugSelector::Checkbox(binding) => binding.widget.id(),
            DrugSelector::Dropdown(binding) => binding.widget.id(),
        }
    }

    fn error_field(&self, ctx: &FormContext) -> String {
        match self {
            DrugSelector::Checkbox(binding) => binding.error_field(ctx),
            DrugSelector::Dropdown(binding) => binding.error_field(ctx),
        }
    }

    fn select(&mut self, drug: DrugId) {
        match self {
            DrugSelector::Checkbox(binding) => binding.widget.set_initial_value(Some(drug.to_string())),
            DrugSelector::Dropdown(binding) => binding.widget.set_initial_value(Some(drug.to_string())),
        }
    }

    fn selection(
        &self,
        ctx: &FormContext,
        submission: &Submission,
    ) -> Result<DrugSelection, WidgetError> {
        let posted = match self {
            DrugSelector::Checkbox(binding) => binding.widget.value(ctx, submission)?,
            DrugSelector::Dropdown(binding) => binding.widget.value(ctx, submission)?,
        };
        Ok(DrugSelection::from_posted(posted))
    }

    pub fn style(&self) -> SelectorStyle {
        match self {
            DrugSelector::Checkbox(_) => SelectorStyle::Checkbox,
            DrugSelector::Dropdown(_) => SelectorStyle::Dropdown,
        }
    }
}

/// Dose plus the two halves of the compound frequency; absent when hidden by the author.
#[derive(Clone, Debug)]
struct DoseFrequencyFields {
    dose: WidgetBinding<NumberFieldWidget>,
    frequency: WidgetBinding<DropdownWidget>,
    frequency_week: WidgetBinding<DropdownWidget>,
}

#[derive(Clone, Debug)]
struct InstructionsField {
    label: String,
    binding: WidgetBinding<TextFieldWidget>,
}

/// The element's input fields, by their logical name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Drug,
    Dose,
    Frequency,
    FrequencyWeek,
    StartDate,
    DiscontinuedDate,
    DiscontinuedReason,
    Instructions,
}

impl FieldKind {
    pub const ALL: [FieldKind; 8] = [
        FieldKind::Drug,
        FieldKind::StartDate,
        FieldKind::Dose,
        FieldKind::Frequency,
        FieldKind::FrequencyWeek,
        FieldKind::DiscontinuedDate,
        FieldKind::DiscontinuedReason,
        FieldKind::Instructions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Drug => "drug",
            FieldKind::Dose => "dose",
            FieldKind::Frequency => "frequency",
            FieldKind::FrequencyWeek => "frequencyWeek",
            FieldKind::StartDate => "startDate",
            FieldKind::DiscontinuedDate => "discontinuedDate",
            FieldKind::DiscontinuedReason => "discontinuedReason",
            FieldKind::Instructions => "instructions",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// Result of applying a submission.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum SubmissionOutcome {
    /// A new order was added to the encounter.
    Created { order: DrugOrder },
    /// The bound order was changed in place.
    Updated { order: DrugOrder },
    /// The bound order was voided because the drug was de-selected.
    Voided { order: DrugOrder },
    Unchanged,
}

#[derive(Clone, Debug)]
pub struct DrugOrderElement {
    config: FieldConfiguration,
    drug: DrugSelector,
    start_date: WidgetBinding<DateWidget>,
    dose_frequency: Option<DoseFrequencyFields>,
    discontinued_date: WidgetBinding<DateWidget>,
    discontinued_reason: Option<WidgetBinding<DropdownWidget>>,
    instructions: Option<InstructionsField>,
    bound_order: Option<DrugOrder>,
}

impl DrugOrderElement {
    /// Configures the element, registers its widgets and binds an existing order when the
    /// context is re-opening a saved encounter.
    pub fn new(
        ctx: &mut FormContext,
        parameters: &BTreeMap<String, String>,
        catalog: &dyn ConceptService,
    ) -> ConfigurationResult<Self> {
        let config = FieldConfiguration::from_parameters(parameters, catalog)?;
        let mut element = Self::register(ctx, config);
        element.bind_existing_order(ctx);
        Ok(element)
    }

    pub fn configuration(&self) -> &FieldConfiguration {
        &self.config
    }

    pub fn selector_style(&self) -> SelectorStyle {
        self.drug.style()
    }

    /// The existing order this element is editing or displaying, if one was claimed.
    pub fn bound_order(&self) -> Option<&DrugOrder> {
        self.bound_order.as_ref()
    }

    /// Posted name of an input field, or `None` when the field is not part of this element.
    pub fn field_name(&self, ctx: &FormContext, kind: FieldKind) -> Option<String> {
        self.widget_id(kind)
            .and_then(|id| ctx.field_name(id))
            .map(str::to_string)
    }

    /// Posted name of the error widget paired with an input field.
    pub fn error_field_name(&self, ctx: &FormContext, kind: FieldKind) -> Option<String> {
        self.widget_id(kind)
            .and_then(|id| ctx.error_widget_for(id))
            .and_then(|id| ctx.field_name(id))
            .map(str::to_string)
    }

    fn widget_id(&self, kind: FieldKind) -> Option<WidgetId> {
        match kind {
            FieldKind::Drug => Some(self.drug.widget_id()),
            FieldKind::StartDate => Some(self.start_date.widget.id()),
            FieldKind::Dose => self.dose_frequency.as_ref().map(|f| f.dose.widget.id()),
            FieldKind::Frequency => self.dose_frequency.as_ref().map(|f| f.frequency.widget.id()),
            FieldKind::FrequencyWeek => self
                .dose_frequency
                .as_ref()
                .map(|f| f.frequency_week.widget.id()),
            FieldKind::DiscontinuedDate => Some(self.discontinued_date.widget.id()),
            FieldKind::DiscontinuedReason => {
                self.discontinued_reason.as_ref().map(|b| b.widget.id())
            }
            FieldKind::Instructions => self.instructions.as_ref().map(|i| i.binding.widget.id()),
        }
    }
}
