//! Drug order domain records and the pool of existing orders shared between form elements.

use crate::catalog::Drug;
use crate::error::{LoadError, LoadResult};
use chrono::{DateTime, NaiveDate, Utc};
use rxform_types::{ConceptId, DrugId, NonEmptyText};
use rxform_uuid::UuidService;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    #[default]
    Drug,
}

/// A prescribed medication for one patient.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DrugOrder {
    pub uuid: UuidService,
    #[serde(default)]
    pub order_type: OrderType,
    pub patient_id: Uuid,
    pub drug: DrugId,
    pub concept: ConceptId,
    #[serde(default)]
    pub dose: Option<f64>,
    /// Compound frequency in `"<times>/d <days>d/w"` form.
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub discontinued: bool,
    #[serde(default)]
    pub discontinued_date: Option<NaiveDate>,
    #[serde(default)]
    pub discontinued_reason: Option<ConceptId>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub voided: bool,
    #[serde(default)]
    pub voided_by: Option<NonEmptyText>,
    #[serde(default)]
    pub void_reason: Option<String>,
    #[serde(default)]
    pub creator: Option<NonEmptyText>,
    #[serde(default)]
    pub date_created: Option<DateTime<Utc>>,
}

impl DrugOrder {
    /// A fresh, unsaved order of `drug` for `patient_id` with a newly generated UUID.
    pub fn new(patient_id: Uuid, drug: &Drug) -> Self {
        Self {
            uuid: UuidService::new(),
            order_type: OrderType::Drug,
            patient_id,
            drug: drug.id,
            concept: drug.concept,
            dose: None,
            frequency: None,
            start_date: None,
            discontinued: false,
            discontinued_date: None,
            discontinued_reason: None,
            instructions: None,
            voided: false,
            voided_by: None,
            void_reason: None,
            creator: None,
            date_created: None,
        }
    }

    pub fn void(&mut self, by: NonEmptyText, reason: impl Into<String>) {
        self.voided = true;
        self.voided_by = Some(by);
        self.void_reason = Some(reason.into());
    }
}

/// The encounter a form submission writes into.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Encounter {
    orders: Vec<DrugOrder>,
    date_changed: Option<DateTime<Utc>>,
}

impl Encounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_order(&mut self, order: DrugOrder) {
        self.orders.push(order);
    }

    pub fn mark_changed(&mut self, at: DateTime<Utc>) {
        self.date_changed = Some(at);
    }

    /// Orders created during this submission.
    pub fn orders(&self) -> &[DrugOrder] {
        &self.orders
    }

    pub fn date_changed(&self) -> Option<DateTime<Utc>> {
        self.date_changed
    }
}

/// Existing, not-yet-claimed orders of the patient, keyed by concept.
///
/// Every element that binds to an existing order removes it from the pool, so an order can be
/// claimed by at most one element per form instantiation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExistingOrderPool {
    by_concept: BTreeMap<ConceptId, Vec<DrugOrder>>,
}

impl ExistingOrderPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a pool from the patient's orders. Voided orders are never offered for binding.
    pub fn from_orders(orders: impl IntoIterator<Item = DrugOrder>) -> Self {
        let mut pool = Self::new();
        for order in orders {
            if order.voided {
                tracing::debug!(order = %order.uuid, "skipping voided order for binding");
                continue;
            }
            pool.by_concept.entry(order.concept).or_default().push(order);
        }
        pool
    }

    /// Builds a pool from `orders`, keeping only those of `patient_id`.
    pub fn for_patient(orders: impl IntoIterator<Item = DrugOrder>, patient_id: Uuid) -> Self {
        Self::from_orders(orders.into_iter().filter(|order| {
            let own = order.patient_id == patient_id;
            if !own {
                tracing::debug!(order = %order.uuid, "skipping order of another patient");
            }
            own
        }))
    }

    /// Parse a YAML list of orders into a pool of `patient_id`'s orders.
    pub fn from_yaml(yaml_text: &str, patient_id: Uuid) -> LoadResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        let orders: Vec<DrugOrder> =
            serde_path_to_error::deserialize(deserializer).map_err(|err| {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() { "<root>" } else { path.as_str() };
                LoadError::Translation(format!("existing orders schema mismatch at {path}: {source}"))
            })?;
        Ok(Self::for_patient(orders, patient_id))
    }

    pub fn load(path: &Path, patient_id: Uuid) -> LoadResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text, patient_id)
    }

    pub fn contains_concept(&self, concept: ConceptId) -> bool {
        self.by_concept
            .get(&concept)
            .is_some_and(|orders| !orders.is_empty())
    }

    /// Removes and returns the first unclaimed order of exactly `drug`.
    ///
    /// Orders are bucketed by concept; another formulation of the same concept is left in place
    /// for a sibling element configured with that formulation.
    pub fn claim(&mut self, drug: &Drug) -> Option<DrugOrder> {
        let orders = self.by_concept.get_mut(&drug.concept)?;
        let position = orders.iter().position(|order| order.drug == drug.id)?;
        let order = orders.remove(position);
        if orders.is_empty() {
            self.by_concept.remove(&drug.concept);
        }
        Some(order)
    }

    pub fn len(&self) -> usize {
        self.by_concept.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
