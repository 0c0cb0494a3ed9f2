use super::{DrugOrderElement, DrugSelection, SubmissionOutcome};
use crate::catalog::Drug;
use crate::context::{FormContext, Mode, Submission};
use crate::error::{SubmissionError, SubmissionResult, WidgetError};
use crate::frequency::Frequency;
use crate::order::DrugOrder;
use crate::session::FormSession;
use crate::widget::Widget;
use chrono::{NaiveDate, Utc};
use rxform_types::ConceptId;

/// Everything a create or update writes onto an order.
#[derive(Debug)]
struct OrderValues {
    drug: Drug,
    dose: Option<f64>,
    frequency: Option<String>,
    start_date: Option<NaiveDate>,
    discontinued_date: Option<NaiveDate>,
    discontinued_reason: Option<ConceptId>,
    instructions: Option<String>,
}

impl OrderValues {
    fn apply_to(self, order: &mut DrugOrder) {
        order.drug = self.drug.id;
        order.concept = self.drug.concept;
        order.dose = self.dose;
        order.frequency = self.frequency;
        order.start_date = self.start_date;
        if let Some(date) = self.discontinued_date {
            order.discontinued_date = Some(date);
            order.discontinued = true;
        }
        if let Some(reason) = self.discontinued_reason {
            order.discontinued_reason = Some(reason);
        }
        if let Some(instructions) = self.instructions {
            order.instructions = Some(instructions);
        }
    }
}

fn widget_value<T>(field: &'static str, value: Result<T, WidgetError>) -> SubmissionResult<T> {
    value.map_err(|source| SubmissionError::Widget { field, source })
}

impl DrugOrderElement {
    /// Applies a validated post: creates, updates or voids an order, or leaves things alone.
    ///
    /// Validation is a separate step and must run first; values it would have rejected surface
    /// here as [`SubmissionError`]s. A bound order of a patient other than the session's is
    /// never touched.
    pub fn handle_submission(
        &mut self,
        session: &mut FormSession,
        submission: &Submission,
    ) -> SubmissionResult<SubmissionOutcome> {
        let mode = session.context().mode();
        if let Some(order) = &self.bound_order {
            if order.patient_id != session.patient_id() {
                return Err(SubmissionError::PatientMismatch {
                    order: order.uuid.to_string(),
                    owner: order.patient_id,
                    patient: session.patient_id(),
                });
            }
        }
        let selection = widget_value("drug", self.drug.selection(session.context(), submission))?;

        match (selection, mode) {
            (DrugSelection::Drug(_), Mode::View) => Ok(SubmissionOutcome::Unchanged),
            (DrugSelection::Drug(drug), Mode::Enter | Mode::Edit) => {
                let values = self.order_values(session.context(), submission, &drug)?;
                match (self.bound_order.as_mut(), mode) {
                    (Some(order), Mode::Edit) => {
                        tracing::debug!(
                            order = %order.uuid,
                            drug = %values.drug.id,
                            start_date = ?values.start_date,
                            "modifying drug order"
                        );
                        values.apply_to(order);
                        session.encounter_mut().mark_changed(Utc::now());
                        Ok(SubmissionOutcome::Updated {
                            order: order.clone(),
                        })
                    }
                    (Some(_), Mode::Enter | Mode::View) | (None, _) => {
                        let mut order = DrugOrder::new(session.patient_id(), &values.drug);
                        order.creator = Some(session.actor().clone());
                        order.date_created = Some(Utc::now());
                        tracing::debug!(
                            order = %order.uuid,
                            drug = %values.drug.id,
                            start_date = ?values.start_date,
                            "adding new drug order"
                        );
                        values.apply_to(&mut order);
                        session.encounter_mut().add_order(order.clone());
                        Ok(SubmissionOutcome::Created { order })
                    }
                }
            }
            (DrugSelection::Nothing | DrugSelection::Placeholder, _) => {
                match self.bound_order.as_mut() {
                    Some(order) => {
                        let reason = format!("Drug De-selected in {}", session.form_name());
                        tracing::debug!(order = %order.uuid, %reason, "voiding drug order");
                        order.void(session.actor().clone(), reason);
                        Ok(SubmissionOutcome::Voided {
                            order: order.clone(),
                        })
                    }
                    None => Ok(SubmissionOutcome::Unchanged),
                }
            }
        }
    }

    fn order_values(
        &self,
        ctx: &FormContext,
        submission: &Submission,
        drug_value: &str,
    ) -> SubmissionResult<OrderValues> {
        let drug = self
            .config
            .entry_for_value(drug_value)
            .map(|entry| entry.drug.clone())
            .ok_or_else(|| SubmissionError::UnknownDrug(drug_value.to_string()))?;

        let (dose, frequency) = match &self.dose_frequency {
            None => (drug.dose_strength, None),
            Some(fields) => {
                let dose = widget_value("dose", fields.dose.widget.value(ctx, submission))?;
                let times = widget_value("frequency", fields.frequency.widget.value(ctx, submission))?;
                let days = widget_value(
                    "frequencyWeek",
                    fields.frequency_week.widget.value(ctx, submission),
                )?;
                let frequency = match (times, days) {
                    (Some(times), Some(days)) => Some(Frequency::from_parts(&times, &days)?.encode()),
                    _ => None,
                };
                (dose, frequency)
            }
        };

        let start_date = widget_value("startDate", self.start_date.widget.value(ctx, submission))?;
        let discontinued_date = widget_value(
            "discontinuedDate",
            self.discontinued_date.widget.value(ctx, submission),
        )?;

        let discontinued_reason = match (&self.discontinued_reason, self.config.discontinued_reason()) {
            (Some(binding), Some(reason)) => {
                match widget_value("discontinuedReason", binding.widget.value(ctx, submission))? {
                    Some(value) => {
                        let id = value
                            .parse::<ConceptId>()
                            .ok()
                            .filter(|id| reason.contains_answer(*id))
                            .ok_or(SubmissionError::UnknownDiscontinuedReason(value))?;
                        Some(id)
                    }
                    None => None,
                }
            }
            _ => None,
        };

        let instructions = match &self.instructions {
            Some(field) => {
                widget_value("instructions", field.binding.widget.value(ctx, submission))?
            }
            None => None,
        };

        Ok(OrderValues {
            drug,
            dose,
            frequency,
            start_date,
            discontinued_date,
            discontinued_reason,
            instructions,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::constants::{
        PARAM_CHECKBOX, PARAM_DISCONTINUED_REASON, PARAM_DRUG_NAMES,
        PARAM_HIDE_DOSE_AND_FREQUENCY, PARAM_INSTRUCTIONS_LABEL,
    };
    use crate::context::{FormContext, Mode, Submission};
    use crate::element::{DrugOrderElement, FieldKind, SelectorStyle, SubmissionOutcome};
    use crate::error::SubmissionError;
    use crate::order::{DrugOrder, ExistingOrderPool};
    use crate::session::FormSession;
    use crate::test_support::{catalog, context, existing_order, params};
    use chrono::NaiveDate;
    use rxform_types::{ConceptId, DrugId, NonEmptyText};
    use uuid::Uuid;

    fn patient() -> Uuid {
        Uuid::from_u128(0x42)
    }

    fn session(ctx: FormContext) -> FormSession {
        FormSession::new(
            ctx,
            patient(),
            NonEmptyText::new("nurse.jones").expect("actor"),
            NonEmptyText::new("HIV Treatment").expect("form"),
        )
    }

    fn setup(ctx: FormContext, extra: &[(&str, &str)]) -> (DrugOrderElement, FormSession) {
        let mut ctx = ctx;
        let mut pairs = vec![
            (PARAM_DRUG_NAMES, "2,3,5"),
            (PARAM_DISCONTINUED_REASON, "1252"),
            (PARAM_INSTRUCTIONS_LABEL, "Notes"),
        ];
        pairs.extend_from_slice(extra);
        let element =
            DrugOrderElement::new(&mut ctx, &params(&pairs), &catalog()).expect("element");
        (element, session(ctx))
    }

    fn post(element: &DrugOrderElement, session: &FormSession, values: &[(FieldKind, &str)]) -> Submission {
        values
            .iter()
            .map(|(kind, value)| {
                (
                    element
                        .field_name(session.context(), *kind)
                        .expect("field is configured"),
                    value.to_string(),
                )
            })
            .collect()
    }

    fn edit_context_with(order: DrugOrder) -> FormContext {
        context(Mode::Edit).with_existing_orders(ExistingOrderPool::from_orders([order]))
    }

    #[test]
    fn enter_creates_one_order_on_the_encounter() {
        let (mut element, mut session) = setup(context(Mode::Enter), &[]);
        let submission = post(
            &element,
            &session,
            &[
                (FieldKind::Drug, "2"),
                (FieldKind::Dose, "1.5"),
                (FieldKind::Frequency, "3"),
                (FieldKind::FrequencyWeek, "5"),
                (FieldKind::StartDate, "2026-01-05"),
                (FieldKind::Instructions, "after food"),
            ],
        );
        assert!(element.validate_submission(session.context(), &submission).is_empty());

        let outcome = element
            .handle_submission(&mut session, &submission)
            .expect("submission");

        let SubmissionOutcome::Created { order } = outcome else {
            panic!("expected a created order, got {outcome:?}");
        };
        assert_eq!(session.encounter().orders(), [order.clone()]);
        assert_eq!(order.drug, DrugId::new(2));
        assert_eq!(order.concept, ConceptId::new(792));
        assert_eq!(order.patient_id, patient());
        assert_eq!(order.dose, Some(1.5));
        assert_eq!(order.frequency.as_deref(), Some("3/d 5d/w"));
        assert_eq!(order.start_date, NaiveDate::from_ymd_opt(2026, 1, 5));
        assert_eq!(order.instructions.as_deref(), Some("after food"));
        assert_eq!(order.creator.as_ref().map(NonEmptyText::as_str), Some("nurse.jones"));
        assert!(order.date_created.is_some());
        assert!(!order.discontinued);
        assert!(!order.voided);
    }

    #[test]
    fn hidden_dose_uses_drug_strength() {
        let (mut element, mut session) =
            setup(context(Mode::Enter), &[(PARAM_HIDE_DOSE_AND_FREQUENCY, "true")]);
        let submission = post(
            &element,
            &session,
            &[(FieldKind::Drug, "5"), (FieldKind::StartDate, "2026-01-05")],
        );

        let outcome = element
            .handle_submission(&mut session, &submission)
            .expect("submission");
        let SubmissionOutcome::Created { order } = outcome else {
            panic!("expected a created order");
        };
        assert_eq!(order.dose, Some(325.0));
        assert_eq!(order.frequency, None);
    }

    #[test]
    fn half_selected_frequency_is_not_recorded() {
        let (mut element, mut session) = setup(context(Mode::Enter), &[]);
        let submission = post(
            &element,
            &session,
            &[
                (FieldKind::Drug, "5"),
                (FieldKind::Dose, "1"),
                (FieldKind::Frequency, "3"),
                (FieldKind::StartDate, "2026-01-05"),
            ],
        );

        let outcome = element
            .handle_submission(&mut session, &submission)
            .expect("submission");
        assert!(matches!(outcome, SubmissionOutcome::Created { order } if order.frequency.is_none()));
    }

    #[test]
    fn discontinued_date_marks_order_discontinued() {
        let (mut element, mut session) = setup(context(Mode::Enter), &[]);
        let submission = post(
            &element,
            &session,
            &[
                (FieldKind::Drug, "5"),
                (FieldKind::Dose, "1"),
                (FieldKind::StartDate, "2026-01-05"),
                (FieldKind::DiscontinuedDate, "2026-02-01"),
                (FieldKind::DiscontinuedReason, "843"),
            ],
        );

        let outcome = element
            .handle_submission(&mut session, &submission)
            .expect("submission");
        let SubmissionOutcome::Created { order } = outcome else {
            panic!("expected a created order");
        };
        assert!(order.discontinued);
        assert_eq!(order.discontinued_date, NaiveDate::from_ymd_opt(2026, 2, 1));
        assert_eq!(order.discontinued_reason, Some(ConceptId::new(843)));
        assert_eq!(order.instructions, None);
    }

    #[test]
    fn edit_with_bound_order_updates_in_place() {
        let existing = existing_order(2);
        let (mut element, mut session) = setup(edit_context_with(existing.clone()), &[]);
        let submission = post(
            &element,
            &session,
            &[
                (FieldKind::Drug, "3"),
                (FieldKind::Dose, "2"),
                (FieldKind::Frequency, "1"),
                (FieldKind::FrequencyWeek, "7"),
                (FieldKind::StartDate, "2026-01-10"),
            ],
        );

        let outcome = element
            .handle_submission(&mut session, &submission)
            .expect("submission");
        let SubmissionOutcome::Updated { order } = outcome else {
            panic!("expected an update");
        };
        assert_eq!(order.uuid, existing.uuid);
        assert_eq!(order.drug, DrugId::new(3));
        assert_eq!(order.frequency.as_deref(), Some("1/d 7d/w"));
        assert_eq!(element.bound_order(), Some(&order));
        assert!(session.encounter().orders().is_empty());
        assert!(session.encounter().date_changed().is_some());
    }

    #[test]
    fn edit_without_bound_order_creates() {
        let (mut element, mut session) = setup(context(Mode::Edit), &[]);
        let submission = post(
            &element,
            &session,
            &[
                (FieldKind::Drug, "2"),
                (FieldKind::Dose, "1"),
                (FieldKind::StartDate, "2026-01-05"),
            ],
        );

        let outcome = element
            .handle_submission(&mut session, &submission)
            .expect("submission");
        assert!(matches!(outcome, SubmissionOutcome::Created { .. }));
        assert_eq!(session.encounter().orders().len(), 1);
    }

    #[test]
    fn deselecting_voids_the_bound_order() {
        let existing = existing_order(2);
        let (mut element, mut session) = setup(edit_context_with(existing.clone()), &[]);

        let outcome = element
            .handle_submission(&mut session, &Submission::new())
            .expect("submission");

        let SubmissionOutcome::Voided { order } = outcome else {
            panic!("expected a void");
        };
        assert_eq!(order.uuid, existing.uuid);
        assert!(order.voided);
        assert_eq!(order.voided_by.as_ref().map(NonEmptyText::as_str), Some("nurse.jones"));
        assert_eq!(order.void_reason.as_deref(), Some("Drug De-selected in HIV Treatment"));
        assert_eq!(order.start_date, existing.start_date);
        assert!(session.encounter().orders().is_empty());
    }

    #[test]
    fn nothing_selected_without_bound_order_is_a_no_op() {
        let (mut element, mut session) = setup(context(Mode::Enter), &[]);
        let outcome = element
            .handle_submission(&mut session, &Submission::new())
            .expect("submission");
        assert_eq!(outcome, SubmissionOutcome::Unchanged);
        assert!(session.encounter().orders().is_empty());
    }

    #[test]
    fn view_mode_ignores_a_selected_drug() {
        let existing = existing_order(2);
        let ctx = context(Mode::View).with_existing_orders(ExistingOrderPool::from_orders([existing]));
        let (mut element, mut session) = setup(ctx, &[]);
        let submission = post(&element, &session, &[(FieldKind::Drug, "3")]);

        let outcome = element
            .handle_submission(&mut session, &submission)
            .expect("submission");
        assert_eq!(outcome, SubmissionOutcome::Unchanged);
        assert_eq!(element.bound_order().map(|order| order.drug), Some(DrugId::new(2)));
        assert!(session.encounter().orders().is_empty());
    }

    #[test]
    fn view_mode_still_voids_when_nothing_is_selected() {
        let ctx = context(Mode::View).with_existing_orders(ExistingOrderPool::from_orders([existing_order(2)]));
        let (mut element, mut session) = setup(ctx, &[]);

        let outcome = element
            .handle_submission(&mut session, &Submission::new())
            .expect("submission");
        assert!(matches!(outcome, SubmissionOutcome::Voided { order } if order.voided));
    }

    #[test]
    fn bound_order_of_another_patient_is_refused() {
        let existing = existing_order(2);
        let mut ctx = edit_context_with(existing.clone());
        let mut element = DrugOrderElement::new(
            &mut ctx,
            &params(&[(PARAM_DRUG_NAMES, "2,3,5")]),
            &catalog(),
        )
        .expect("element");
        let mut other = FormSession::new(
            ctx,
            Uuid::from_u128(0x99),
            NonEmptyText::new("nurse.jones").expect("actor"),
            NonEmptyText::new("HIV Treatment").expect("form"),
        );

        let update = post(
            &element,
            &other,
            &[
                (FieldKind::Drug, "2"),
                (FieldKind::Dose, "1"),
                (FieldKind::StartDate, "2026-01-05"),
            ],
        );
        assert!(matches!(
            element.handle_submission(&mut other, &update),
            Err(SubmissionError::PatientMismatch { owner, .. }) if owner == patient()
        ));
        assert!(matches!(
            element.handle_submission(&mut other, &Submission::new()),
            Err(SubmissionError::PatientMismatch { .. })
        ));
        assert_eq!(element.bound_order(), Some(&existing));
        assert!(other.encounter().orders().is_empty());
    }

    #[test]
    fn checkbox_checked_creates_order() {
        let mut ctx = context(Mode::Enter);
        let mut element = DrugOrderElement::new(
            &mut ctx,
            &params(&[
                (PARAM_DRUG_NAMES, "5"),
                (PARAM_CHECKBOX, "true"),
                (PARAM_HIDE_DOSE_AND_FREQUENCY, "true"),
            ]),
            &catalog(),
        )
        .expect("element");
        let mut session = session(ctx);
        assert_eq!(element.selector_style(), SelectorStyle::Checkbox);

        let submission = post(
            &element,
            &session,
            &[(FieldKind::Drug, "5"), (FieldKind::StartDate, "2026-01-05")],
        );
        assert!(element.validate_submission(session.context(), &submission).is_empty());

        let outcome = element
            .handle_submission(&mut session, &submission)
            .expect("submission");
        let SubmissionOutcome::Created { order } = outcome else {
            panic!("expected a created order, got {outcome:?}");
        };
        assert_eq!(order.drug, DrugId::new(5));
        assert_eq!(order.dose, Some(325.0));
        assert_eq!(session.encounter().orders().len(), 1);
    }

    #[test]
    fn unchecked_checkbox_voids_bound_order() {
        let existing = existing_order(5);
        let mut ctx = edit_context_with(existing.clone());
        let mut element = DrugOrderElement::new(
            &mut ctx,
            &params(&[(PARAM_DRUG_NAMES, "5"), (PARAM_CHECKBOX, "true")]),
            &catalog(),
        )
        .expect("element");
        let mut session = session(ctx);
        assert_eq!(element.selector_style(), SelectorStyle::Checkbox);
        assert_eq!(element.bound_order().map(|order| order.uuid), Some(existing.uuid));

        let outcome = element
            .handle_submission(&mut session, &Submission::new())
            .expect("submission");
        let SubmissionOutcome::Voided { order } = outcome else {
            panic!("expected a void, got {outcome:?}");
        };
        assert_eq!(order.uuid, existing.uuid);
        assert!(order.voided);
        assert!(session.encounter().orders().is_empty());
    }

    #[test]
    fn unvalidated_garbage_is_an_error_not_a_panic() {
        let (mut element, mut session) = setup(context(Mode::Enter), &[]);

        let unknown = post(&element, &session, &[(FieldKind::Drug, "999")]);
        assert!(matches!(
            element.handle_submission(&mut session, &unknown),
            Err(SubmissionError::UnknownDrug(id)) if id == "999"
        ));

        let bad_dose = post(&element, &session, &[(FieldKind::Drug, "2"), (FieldKind::Dose, "x")]);
        assert!(matches!(
            element.handle_submission(&mut session, &bad_dose),
            Err(SubmissionError::Widget { field: "dose", .. })
        ));

        let bad_reason = post(
            &element,
            &session,
            &[(FieldKind::Drug, "2"), (FieldKind::DiscontinuedReason, "1")],
        );
        assert!(matches!(
            element.handle_submission(&mut session, &bad_reason),
            Err(SubmissionError::UnknownDiscontinuedReason(_))
        ));
        assert!(session.encounter().orders().is_empty());
    }
}
