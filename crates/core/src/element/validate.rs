use super::{DrugOrderElement, DrugSelection};
use crate::context::{FieldError, FormContext, Submission};
use crate::messages::codes;
use crate::widget::{DropdownWidget, Widget, WidgetBinding};
use rxform_types::ConceptId;

impl DrugOrderElement {
    /// Checks a post before it is applied. An empty result means the submission is safe to hand
    /// to [`DrugOrderElement::handle_submission`].
    pub fn validate_submission(&self, ctx: &FormContext, submission: &Submission) -> Vec<FieldError> {
        let mut errors = Vec::new();
        let mut fail = |field: String, code: &str| {
            errors.push(FieldError::new(field, ctx.message(code)));
        };

        let selected = match self.drug.selection(ctx, submission) {
            Ok(DrugSelection::Drug(value)) => value,
            Ok(DrugSelection::Placeholder) => {
                fail(self.drug.error_field(ctx), codes::ERROR_PLACEHOLDER_SELECTED);
                return errors;
            }
            Ok(DrugSelection::Nothing) => return errors,
            Err(err) => {
                fail(self.drug.error_field(ctx), err.message_code());
                return errors;
            }
        };

        let entry = self.config.entry_for_value(&selected);
        if entry.is_none() {
            fail(self.drug.error_field(ctx), codes::ERROR_UNKNOWN_DRUG);
        }

        if let Some(fields) = &self.dose_frequency {
            match fields.dose.widget.value(ctx, submission) {
                Err(err) => fail(fields.dose.error_field(ctx), err.message_code()),
                Ok(None) => fail(fields.dose.error_field(ctx), codes::ERROR_REQUIRED),
                Ok(Some(dose)) => {
                    let out_of_range = self.config.validates_dose()
                        && entry.is_some_and(|entry| !entry.drug.accepts_daily_dose(dose));
                    if out_of_range {
                        fail(fields.dose.error_field(ctx), codes::ERROR_DOSE_OUT_OF_RANGE);
                    }
                }
            }
            let mut offered = true;
            for selector in [&fields.frequency, &fields.frequency_week] {
                if !is_offered(selector, ctx, submission) {
                    fail(selector.error_field(ctx), codes::ERROR_INVALID_CHOICE);
                    offered = false;
                }
            }
            // Frequency is stored only as a pair.
            if offered {
                let chosen = |binding: &WidgetBinding<DropdownWidget>| {
                    matches!(binding.widget.value(ctx, submission), Ok(Some(_)))
                };
                match (chosen(&fields.frequency), chosen(&fields.frequency_week)) {
                    (true, false) => fail(fields.frequency_week.error_field(ctx), codes::ERROR_REQUIRED),
                    (false, true) => fail(fields.frequency.error_field(ctx), codes::ERROR_REQUIRED),
                    _ => {}
                }
            }
        }

        let start = match self.start_date.widget.value(ctx, submission) {
            Ok(Some(date)) => Some(date),
            Ok(None) => {
                fail(self.start_date.error_field(ctx), codes::ERROR_REQUIRED);
                None
            }
            Err(err) => {
                fail(self.start_date.error_field(ctx), err.message_code());
                None
            }
        };

        let discontinued = self.discontinued_date.widget.value(ctx, submission);
        match (start, &discontinued) {
            (_, Err(err)) => fail(self.discontinued_date.error_field(ctx), err.message_code()),
            (Some(start), Ok(Some(end))) if start > *end => fail(
                self.discontinued_date.error_field(ctx),
                codes::ERROR_DISCONTINUED_BEFORE_START,
            ),
            _ => {}
        }

        if let (Some(binding), Some(reason)) =
            (&self.discontinued_reason, self.config.discontinued_reason())
        {
            match binding.widget.value(ctx, submission) {
                Ok(Some(value)) => {
                    let known = value
                        .parse::<ConceptId>()
                        .is_ok_and(|id| reason.contains_answer(id));
                    if !known {
                        fail(binding.error_field(ctx), codes::ERROR_INVALID_CHOICE);
                    } else if matches!(discontinued, Ok(None)) {
                        fail(binding.error_field(ctx), codes::ERROR_REASON_WITHOUT_DATE);
                    }
                }
                Ok(None) => {}
                Err(err) => fail(binding.error_field(ctx), err.message_code()),
            }
        }

        errors
    }
}

/// Blank, or one of the dropdown's own option values.
fn is_offered(
    binding: &WidgetBinding<DropdownWidget>,
    ctx: &FormContext,
    submission: &Submission,
) -> bool {
    match binding.widget.value(ctx, submission) {
        Ok(None) => true,
        Ok(Some(value)) => binding
            .widget
            .options()
            .iter()
            .any(|option| option.value == value),
        Err(_) => false,
    }
}
