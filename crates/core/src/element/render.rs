use super::{DrugOrderElement, DrugSelector};
use crate::context::{FormContext, Mode};
use crate::messages::codes;
use crate::widget::{escape_html, ErrorWidget, Widget};

impl DrugOrderElement {
    /// Renders the element's fields for the context's mode.
    ///
    /// Each field is emitted as `label widget error`. Error markup is left out in VIEW mode and
    /// the drug label is left out when the drug is a checkbox (the checkbox carries its own).
    pub fn generate_html(&self, ctx: &FormContext) -> String {
        let mut html = String::new();

        match &self.drug {
            DrugSelector::Checkbox(binding) => {
                push_field(&mut html, ctx, None, &binding.widget.render(ctx), &binding.error)
            }
            DrugSelector::Dropdown(binding) => push_field(
                &mut html,
                ctx,
                Some(ctx.message(codes::DRUG)),
                &binding.widget.render(ctx),
                &binding.error,
            ),
        }

        if let Some(fields) = &self.dose_frequency {
            push_field(
                &mut html,
                ctx,
                Some(ctx.message(codes::DOSE)),
                &fields.dose.widget.render(ctx),
                &fields.dose.error,
            );

            html.push_str(&ctx.message(codes::FREQUENCY));
            html.push(' ');
            html.push_str(&fields.frequency.widget.render(ctx));
            push_error(&mut html, ctx, &fields.frequency.error);

            html.push_str(" x ");
            html.push_str(&fields.frequency_week.widget.render(ctx));
            html.push(' ');
            push_error(&mut html, ctx, &fields.frequency_week.error);
        }

        push_field(
            &mut html,
            ctx,
            Some(ctx.message(codes::START_DATE)),
            &self.start_date.widget.render(ctx),
            &self.start_date.error,
        );
        push_field(
            &mut html,
            ctx,
            Some(ctx.message(codes::DISCONTINUED_DATE)),
            &self.discontinued_date.widget.render(ctx),
            &self.discontinued_date.error,
        );

        if let Some(reason) = &self.discontinued_reason {
            push_field(
                &mut html,
                ctx,
                Some(ctx.message(codes::DISCONTINUED_REASON)),
                &reason.widget.render(ctx),
                &reason.error,
            );
        }

        if let Some(instructions) = &self.instructions {
            push_field(
                &mut html,
                ctx,
                Some(escape_html(&instructions.label)),
                &instructions.binding.widget.render(ctx),
                &instructions.binding.error,
            );
        }

        html
    }
}

fn push_field(
    html: &mut String,
    ctx: &FormContext,
    label: Option<String>,
    widget: &str,
    error: &ErrorWidget,
) {
    if let Some(label) = label {
        html.push_str(&label);
        html.push(' ');
    }
    html.push_str(widget);
    html.push(' ');
    push_error(html, ctx, error);
}

fn push_error(html: &mut String, ctx: &FormContext, error: &ErrorWidget) {
    match ctx.mode() {
        Mode::View => {}
        Mode::Enter | Mode::Edit => html.push_str(&error.render(ctx)),
    }
}

#[cfg(test)]
mod tests {
    use crate::constants::{
        PARAM_CHECKBOX, PARAM_DRUG_LABELS, PARAM_DRUG_NAMES, PARAM_HIDE_DOSE_AND_FREQUENCY,
        PARAM_INSTRUCTIONS_LABEL,
    };
    use crate::context::{FieldError, Mode};
    use crate::element::{DrugOrderElement, FieldKind};
    use crate::order::ExistingOrderPool;
    use crate::test_support::{catalog, context, existing_order, params};

    #[test]
    fn enter_mode_renders_every_field_in_order() {
        let mut ctx = context(Mode::Enter);
        let element = DrugOrderElement::new(
            &mut ctx,
            &params(&[(PARAM_DRUG_NAMES, "2,5"), (PARAM_INSTRUCTIONS_LABEL, "Notes")]),
            &catalog(),
        )
        .expect("element");

        let html = element.generate_html(&ctx);
        let positions: Vec<usize> = [
            "Drug <select",
            "Dose <input",
            "Frequency <select",
            " x <select",
            "Start Date <input",
            "Discontinued Date <input",
            "Notes <input",
        ]
        .iter()
        .map(|needle| html.find(needle).unwrap_or_else(|| panic!("missing {needle} in {html}")))
        .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]), "{html}");
        assert!(html.contains(r#"<option value="5">Aspirin</option>"#));
        assert!(html.contains(r#"<option value="10">10/day</option>"#));
        assert!(html.contains(r#"<option value="7">7 days/week</option>"#));
        assert!(html.contains(r#"class="error""#));
    }

    #[test]
    fn checkbox_has_no_drug_label() {
        let mut ctx = context(Mode::Enter);
        let element = DrugOrderElement::new(
            &mut ctx,
            &params(&[
                (PARAM_DRUG_NAMES, "5"),
                (PARAM_DRUG_LABELS, "Aspirin 325mg"),
                (PARAM_CHECKBOX, "true"),
                (PARAM_HIDE_DOSE_AND_FREQUENCY, "true"),
            ]),
            &catalog(),
        )
        .expect("element");

        let html = element.generate_html(&ctx);
        assert!(html.starts_with(r#"<input type="checkbox" name="w1" id="w1" value="5"/>"#));
        assert!(html.contains(">Aspirin 325mg</label>"));
        assert!(!html.contains("Drug "));
        assert!(!html.contains("Dose"));
    }

    #[test]
    fn view_mode_shows_values_without_errors() {
        let mut order = existing_order(2);
        order.frequency = Some("2/d 7d/w".into());
        let mut ctx = context(Mode::View)
            .with_existing_orders(ExistingOrderPool::from_orders([order]));
        let element =
            DrugOrderElement::new(&mut ctx, &params(&[(PARAM_DRUG_NAMES, "2")]), &catalog())
                .expect("element");

        let html = element.generate_html(&ctx);
        assert!(html.contains(r#"Drug <span class="value">Triomune-30</span>"#), "{html}");
        assert!(html.contains(r#"<span class="value">2/day</span>"#), "{html}");
        assert!(html.contains(r#"<span class="value">7 days/week</span>"#), "{html}");
        assert!(html.contains(r#"Start Date <span class="value">2026-01-05</span>"#), "{html}");
        assert!(!html.contains("class=\"error\""));
        assert!(!html.contains("<input"));
    }

    #[test]
    fn recorded_errors_appear_next_to_their_field() {
        let mut ctx = context(Mode::Enter);
        let element =
            DrugOrderElement::new(&mut ctx, &params(&[(PARAM_DRUG_NAMES, "2")]), &catalog())
                .expect("element");
        let field = element
            .error_field_name(&ctx, FieldKind::StartDate)
            .expect("start date error field");
        ctx.record_errors(&[FieldError::new(field.clone(), "Required")]);

        let html = element.generate_html(&ctx);
        assert!(html.contains(&format!(r#"<span class="error" id="{field}">Required</span>"#)));
    }
}
