//! Input widgets and their error displays.
//!
//! A widget is registered with a [`FormContext`], which assigns its posted field name. It renders
//! itself for the context's mode and parses its own value back out of a [`Submission`].

use crate::constants::DATE_FORMAT;
use crate::context::{FormContext, Mode, Submission, WidgetId};
use crate::error::WidgetError;
use crate::messages::codes;
use chrono::NaiveDate;

pub trait Widget {
    type Value;

    fn id(&self) -> WidgetId;

    fn set_initial_value(&mut self, value: Option<Self::Value>);

    fn render(&self, ctx: &FormContext) -> String;

    /// Parses the posted value. Blank input is `Ok(None)` unless the widget requires a value.
    fn value(
        &self,
        ctx: &FormContext,
        submission: &Submission,
    ) -> Result<Option<Self::Value>, WidgetError>;
}

impl WidgetError {
    /// Message code shown to the user for this failure.
    pub fn message_code(&self) -> &'static str {
        match self {
            WidgetError::Required => codes::ERROR_REQUIRED,
            WidgetError::InvalidNumber(_) | WidgetError::NumberOutOfRange { .. } => {
                codes::ERROR_INVALID_NUMBER
            }
            WidgetError::InvalidDate(_) => codes::ERROR_INVALID_DATE,
            WidgetError::Unregistered(_) => codes::ERROR_INVALID_CHOICE,
        }
    }
}

/// An input widget together with the error widget that shows its validation messages.
#[derive(Clone, Debug)]
pub struct WidgetBinding<W> {
    pub widget: W,
    pub error: ErrorWidget,
}

impl<W: Widget> WidgetBinding<W> {
    /// Registers a widget built by `build` and a paired error widget.
    pub fn register(ctx: &mut FormContext, build: impl FnOnce(WidgetId) -> W) -> Self {
        let id = ctx.register_widget();
        let widget = build(id);
        let error = ErrorWidget::new(ctx.register_error_widget(id));
        Self { widget, error }
    }

    /// Posted name of the error widget, used as the target of field errors.
    pub fn error_field(&self, ctx: &FormContext) -> String {
        ctx.field_name(self.error.id()).unwrap_or_default().to_string()
    }
}

fn posted<'a>(
    id: WidgetId,
    ctx: &FormContext,
    submission: &'a Submission,
) -> Result<Option<&'a str>, WidgetError> {
    let name = ctx.field_name(id).ok_or(WidgetError::Unregistered(id))?;
    Ok(submission
        .get(name)
        .map(str::trim)
        .filter(|value| !value.is_empty()))
}

fn name_of(ctx: &FormContext, id: WidgetId) -> &str {
    ctx.field_name(id).unwrap_or_default()
}

/// Free text, e.g. dosing instructions.
#[derive(Clone, Debug)]
pub struct TextFieldWidget {
    id: WidgetId,
    initial: Option<String>,
}

impl TextFieldWidget {
    pub fn new(id: WidgetId) -> Self {
        Self { id, initial: None }
    }
}

impl Widget for TextFieldWidget {
    type Value = String;

    fn id(&self) -> WidgetId {
        self.id
    }

    fn set_initial_value(&mut self, value: Option<String>) {
        self.initial = value;
    }

    fn render(&self, ctx: &FormContext) -> String {
        let value = escape_html(self.initial.as_deref().unwrap_or_default());
        match ctx.mode() {
            Mode::View => format!(r#"<span class="value">{value}</span>"#),
            Mode::Enter | Mode::Edit => {
                let name = name_of(ctx, self.id);
                format!(r#"<input type="text" name="{name}" id="{name}" value="{value}"/>"#)
            }
        }
    }

    fn value(
        &self,
        ctx: &FormContext,
        submission: &Submission,
    ) -> Result<Option<String>, WidgetError> {
        Ok(posted(self.id, ctx, submission)?.map(str::to_string))
    }
}

/// Bounded decimal input.
#[derive(Clone, Debug)]
pub struct NumberFieldWidget {
    id: WidgetId,
    min: f64,
    max: f64,
    nullable: bool,
    initial: Option<f64>,
}

impl NumberFieldWidget {
    pub fn new(id: WidgetId, min: f64, max: f64, nullable: bool) -> Self {
        Self {
            id,
            min,
            max,
            nullable,
            initial: None,
        }
    }
}

impl Widget for NumberFieldWidget {
    type Value = f64;

    fn id(&self) -> WidgetId {
        self.id
    }

    fn set_initial_value(&mut self, value: Option<f64>) {
        self.initial = value;
    }

    fn render(&self, ctx: &FormContext) -> String {
        let value = self.initial.map(|v| v.to_string()).unwrap_or_default();
        match ctx.mode() {
            Mode::View => format!(r#"<span class="value">{value}</span>"#),
            Mode::Enter | Mode::Edit => {
                let name = name_of(ctx, self.id);
                format!(
                    r#"<input type="number" step="any" name="{name}" id="{name}" min="{}" max="{}" value="{value}"/>"#,
                    self.min, self.max
                )
            }
        }
    }

    fn value(
        &self,
        ctx: &FormContext,
        submission: &Submission,
    ) -> Result<Option<f64>, WidgetError> {
        let Some(raw) = posted(self.id, ctx, submission)? else {
            return if self.nullable {
                Ok(None)
            } else {
                Err(WidgetError::Required)
            };
        };
        let value: f64 = raw
            .parse()
            .map_err(|_| WidgetError::InvalidNumber(raw.to_string()))?;
        if !value.is_finite() {
            return Err(WidgetError::InvalidNumber(raw.to_string()));
        }
        if value < self.min || value > self.max {
            return Err(WidgetError::NumberOutOfRange {
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(Some(value))
    }
}

/// Calendar date posted as `YYYY-MM-DD`.
#[derive(Clone, Debug)]
pub struct DateWidget {
    id: WidgetId,
    initial: Option<NaiveDate>,
}

impl DateWidget {
    pub fn new(id: WidgetId) -> Self {
        Self { id, initial: None }
    }
}

impl Widget for DateWidget {
    type Value = NaiveDate;

    fn id(&self) -> WidgetId {
        self.id
    }

    fn set_initial_value(&mut self, value: Option<NaiveDate>) {
        self.initial = value;
    }

    fn render(&self, ctx: &FormContext) -> String {
        let value = self
            .initial
            .map(|date| date.format(DATE_FORMAT).to_string())
            .unwrap_or_default();
        match ctx.mode() {
            Mode::View => format!(r#"<span class="value">{value}</span>"#),
            Mode::Enter | Mode::Edit => {
                let name = name_of(ctx, self.id);
                format!(r#"<input type="date" name="{name}" id="{name}" value="{value}"/>"#)
            }
        }
    }

    fn value(
        &self,
        ctx: &FormContext,
        submission: &Submission,
    ) -> Result<Option<NaiveDate>, WidgetError> {
        posted(self.id, ctx, submission)?
            .map(|raw| {
                NaiveDate::parse_from_str(raw, DATE_FORMAT)
                    .map_err(|_| WidgetError::InvalidDate(raw.to_string()))
            })
            .transpose()
    }
}

/// A single labelled checkbox that posts a fixed value when ticked.
#[derive(Clone, Debug)]
pub struct CheckboxWidget {
    id: WidgetId,
    label: String,
    value: String,
    initial: Option<String>,
}

impl CheckboxWidget {
    pub fn new(id: WidgetId, label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            value: value.into(),
            initial: None,
        }
    }

    pub fn is_checked(&self) -> bool {
        self.initial.as_deref() == Some(self.value.as_str())
    }
}

impl Widget for CheckboxWidget {
    type Value = String;

    fn id(&self) -> WidgetId {
        self.id
    }

    /// Checks the box when `value` equals the checkbox value.
    fn set_initial_value(&mut self, value: Option<String>) {
        self.initial = value;
    }

    fn render(&self, ctx: &FormContext) -> String {
        let label = escape_html(&self.label);
        match ctx.mode() {
            Mode::View => {
                let mark = if self.is_checked() { "[X]" } else { "[&#160;&#160;]" };
                format!(r#"<span class="value">{mark}</span>&#160;{label}"#)
            }
            Mode::Enter | Mode::Edit => {
                let name = name_of(ctx, self.id);
                let checked = if self.is_checked() { r#" checked="true""# } else { "" };
                format!(
                    r#"<input type="checkbox" name="{name}" id="{name}" value="{}"{checked}/><label for="{name}">{label}</label>"#,
                    escape_html(&self.value)
                )
            }
        }
    }

    fn value(
        &self,
        ctx: &FormContext,
        submission: &Submission,
    ) -> Result<Option<String>, WidgetError> {
        Ok(posted(self.id, ctx, submission)?.map(str::to_string))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Single-choice select.
#[derive(Clone, Debug)]
pub struct DropdownWidget {
    id: WidgetId,
    options: Vec<SelectOption>,
    initial: Option<String>,
}

impl DropdownWidget {
    pub fn new(id: WidgetId, options: Vec<SelectOption>) -> Self {
        Self {
            id,
            options,
            initial: None,
        }
    }

    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    pub fn initial_value(&self) -> Option<&str> {
        self.initial.as_deref()
    }
}

impl Widget for DropdownWidget {
    type Value = String;

    fn id(&self) -> WidgetId {
        self.id
    }

    fn set_initial_value(&mut self, value: Option<String>) {
        self.initial = value;
    }

    fn render(&self, ctx: &FormContext) -> String {
        let selected = self.initial.as_deref();
        match ctx.mode() {
            Mode::View => {
                let label = self
                    .options
                    .iter()
                    .find(|option| Some(option.value.as_str()) == selected)
                    .map(|option| escape_html(&option.label))
                    .unwrap_or_default();
                format!(r#"<span class="value">{label}</span>"#)
            }
            Mode::Enter | Mode::Edit => {
                let name = name_of(ctx, self.id);
                let mut html = format!(r#"<select name="{name}" id="{name}">"#);
                for option in &self.options {
                    let flag = if Some(option.value.as_str()) == selected {
                        r#" selected="true""#
                    } else {
                        ""
                    };
                    html.push_str(&format!(
                        r#"<option value="{}"{flag}>{}</option>"#,
                        escape_html(&option.value),
                        escape_html(&option.label)
                    ));
                }
                html.push_str("</select>");
                html
            }
        }
    }

    fn value(
        &self,
        ctx: &FormContext,
        submission: &Submission,
    ) -> Result<Option<String>, WidgetError> {
        Ok(posted(self.id, ctx, submission)?.map(str::to_string))
    }
}

/// Shows the validation messages recorded against its field.
#[derive(Clone, Debug)]
pub struct ErrorWidget {
    id: WidgetId,
}

impl ErrorWidget {
    pub fn new(id: WidgetId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn render(&self, ctx: &FormContext) -> String {
        let name = name_of(ctx, self.id);
        let errors = ctx.errors_for(name);
        if errors.is_empty() {
            return format!(r#"<span class="error" id="{name}" style="display: none"></span>"#);
        }
        let text = errors
            .iter()
            .map(|message| escape_html(message))
            .collect::<Vec<_>>()
            .join("<br/>");
        format!(r#"<span class="error" id="{name}">{text}</span>"#)
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
