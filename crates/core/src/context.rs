//! Per-request rendering context shared by every element of a form.
//!
//! The context owns the widget registry (widget id to posted field name), the pairing of input
//! widgets with their error widgets, the validation errors recorded for display, and the pool of
//! existing orders that elements claim from when a form is re-opened.

use crate::error::UnknownMode;
use crate::messages::MessageSource;
use crate::order::ExistingOrderPool;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// What the user is doing with the form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Filling in a new encounter.
    #[default]
    Enter,
    /// Changing a previously saved encounter.
    Edit,
    /// Read-only display of a saved encounter.
    View,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Enter => "enter",
            Mode::Edit => "edit",
            Mode::View => "view",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enter" => Ok(Mode::Enter),
            "edit" => Ok(Mode::Edit),
            "view" => Ok(Mode::View),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

/// Handle of a widget registered with a [`FormContext`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(u32);

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validation message attached to a posted field.
///
/// `field` is the posted name of the error widget that displays the message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Raw posted form values, keyed by field name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Submission(HashMap<String, String>);

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Submission {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

pub struct FormContext {
    mode: Mode,
    next_widget: u32,
    field_names: HashMap<WidgetId, String>,
    error_widgets: HashMap<WidgetId, WidgetId>,
    errors: HashMap<String, Vec<String>>,
    existing_orders: Option<ExistingOrderPool>,
    messages: Arc<dyn MessageSource>,
}

impl FormContext {
    pub fn new(mode: Mode, messages: Arc<dyn MessageSource>) -> Self {
        Self {
            mode,
            next_widget: 0,
            field_names: HashMap::new(),
            error_widgets: HashMap::new(),
            errors: HashMap::new(),
            existing_orders: None,
            messages,
        }
    }

    /// Attaches the patient's existing orders so elements can bind to them.
    pub fn with_existing_orders(mut self, pool: ExistingOrderPool) -> Self {
        self.existing_orders = Some(pool);
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Allocates a widget id and its posted field name (`w1`, `w2`, ...).
    pub fn register_widget(&mut self) -> WidgetId {
        self.next_widget += 1;
        let id = WidgetId(self.next_widget);
        self.field_names.insert(id, format!("w{}", self.next_widget));
        id
    }

    /// Allocates an error widget and pairs it with `widget`.
    pub fn register_error_widget(&mut self, widget: WidgetId) -> WidgetId {
        let error = self.register_widget();
        self.error_widgets.insert(widget, error);
        error
    }

    pub fn field_name(&self, id: WidgetId) -> Option<&str> {
        self.field_names.get(&id).map(String::as_str)
    }

    pub fn error_widget_for(&self, widget: WidgetId) -> Option<WidgetId> {
        self.error_widgets.get(&widget).copied()
    }

    pub fn existing_orders(&self) -> Option<&ExistingOrderPool> {
        self.existing_orders.as_ref()
    }

    pub fn existing_orders_mut(&mut self) -> Option<&mut ExistingOrderPool> {
        self.existing_orders.as_mut()
    }

    /// Keeps validation errors so error widgets show them on the next render.
    pub fn record_errors(&mut self, errors: &[FieldError]) {
        for error in errors {
            self.errors
                .entry(error.field.clone())
                .or_default()
                .push(error.message.clone());
        }
    }

    pub fn errors_for(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn message(&self, code: &str) -> String {
        self.messages.message(code)
    }
}

impl fmt::Debug for FormContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormContext")
            .field("mode", &self.mode)
            .field("widgets", &self.next_widget)
            .field("errors", &self.errors)
            .field("existing_orders", &self.existing_orders)
            .finish_non_exhaustive()
    }
}
