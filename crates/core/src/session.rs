//! The submitting user's form session.

use crate::context::FormContext;
use crate::order::Encounter;
use rxform_types::NonEmptyText;
use uuid::Uuid;

/// Everything a submission needs besides the posted values: the rendering context, who the
/// patient is, who is submitting, which form this is and the encounter being written.
#[derive(Debug)]
pub struct FormSession {
    context: FormContext,
    patient_id: Uuid,
    actor: NonEmptyText,
    form_name: NonEmptyText,
    encounter: Encounter,
}

impl FormSession {
    pub fn new(
        context: FormContext,
        patient_id: Uuid,
        actor: NonEmptyText,
        form_name: NonEmptyText,
    ) -> Self {
        Self {
            context,
            patient_id,
            actor,
            form_name,
            encounter: Encounter::new(),
        }
    }

    pub fn context(&self) -> &FormContext {
        &self.context
    }

    pub fn patient_id(&self) -> Uuid {
        self.patient_id
    }

    pub fn actor(&self) -> &NonEmptyText {
        &self.actor
    }

    pub fn form_name(&self) -> &NonEmptyText {
        &self.form_name
    }

    pub fn encounter(&self) -> &Encounter {
        &self.encounter
    }

    pub fn encounter_mut(&mut self) -> &mut Encounter {
        &mut self.encounter
    }
}
