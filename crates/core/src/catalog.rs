//! Drug and concept lookup.
//!
//! The element resolves its configuration against a [`ConceptService`]. Production hosts back
//! this with their terminology store; [`InMemoryCatalog`] is a YAML-backed implementation used by
//! the bundled binaries and the tests.
//!
//! Catalog YAML shape:
//!
//! ```yaml
//! drugs:
//!   - id: 2
//!     uuid: 3cfcf118-931c-46f7-8ff6-7b876f0d4202
//!     name: Triomune-30
//!     concept: 792
//!     dose_strength: 1.0
//!     minimum_daily_dose: 1.0
//!     maximum_daily_dose: 2.0
//! concepts:
//!   - id: 792
//!     uuid: 792AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA
//!     name: Stavudine lamivudine and nevirapine
//! ```

use crate::error::{LoadError, LoadResult};
use rxform_types::{ConceptId, DrugId, NonEmptyText};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A concrete drug formulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Drug {
    pub id: DrugId,
    pub uuid: String,
    pub name: NonEmptyText,
    /// The clinical concept this drug is a formulation of.
    pub concept: ConceptId,
    /// Base dose strength, used as the dose when dose entry is hidden.
    #[serde(default)]
    pub dose_strength: Option<f64>,
    #[serde(default)]
    pub minimum_daily_dose: Option<f64>,
    #[serde(default)]
    pub maximum_daily_dose: Option<f64>,
}

impl Drug {
    /// Returns true if `dose` lies within this drug's configured daily dose bounds.
    ///
    /// Each bound is optional and checked on its own.
    pub fn accepts_daily_dose(&self, dose: f64) -> bool {
        let above_min = self.minimum_daily_dose.map_or(true, |min| dose >= min);
        let below_max = self.maximum_daily_dose.map_or(true, |max| dose <= max);
        above_min && below_max
    }
}

/// A coded concept, optionally with an answer set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Concept {
    pub id: ConceptId,
    pub uuid: String,
    pub name: NonEmptyText,
    #[serde(default)]
    pub answers: Vec<ConceptId>,
}

/// Lookup operations the element needs from the terminology store.
pub trait ConceptService {
    fn drug_by_uuid(&self, uuid: &str) -> Option<Drug>;

    /// Resolves a numeric drug id, falling back to an exact (case-insensitive) name match.
    fn drug_by_name_or_id(&self, name_or_id: &str) -> Option<Drug>;

    fn concept_by_uuid(&self, uuid: &str) -> Option<Concept>;

    fn concept(&self, id: ConceptId) -> Option<Concept>;

    /// Answer concepts of `concept`, in their configured order.
    fn concept_answers(&self, concept: &Concept) -> Vec<Concept>;
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogWire {
    #[serde(default)]
    drugs: Vec<Drug>,
    #[serde(default)]
    concepts: Vec<Concept>,
}

/// Catalog held entirely in memory.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InMemoryCatalog {
    drugs: Vec<Drug>,
    concepts: Vec<Concept>,
}

impl InMemoryCatalog {
    /// Builds a catalog, rejecting duplicate ids and answers that point at unknown concepts.
    pub fn new(drugs: Vec<Drug>, concepts: Vec<Concept>) -> LoadResult<Self> {
        let mut drug_ids = HashSet::new();
        for drug in &drugs {
            if !drug_ids.insert(drug.id) {
                return Err(LoadError::DuplicateDrug(drug.id));
            }
        }

        let mut concept_ids = HashSet::new();
        for concept in &concepts {
            if !concept_ids.insert(concept.id) {
                return Err(LoadError::DuplicateConcept(concept.id));
            }
        }

        for concept in &concepts {
            if let Some(answer) = concept
                .answers
                .iter()
                .find(|answer| !concept_ids.contains(answer))
            {
                return Err(LoadError::UnknownAnswer {
                    concept: concept.id,
                    answer: *answer,
                });
            }
        }

        Ok(Self { drugs, concepts })
    }

    /// Parse a catalog from YAML text.
    ///
    /// Schema mismatches are reported with the path of the failing field
    /// (e.g. `drugs[1].concept`).
    pub fn from_yaml(yaml_text: &str) -> LoadResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        let wire: CatalogWire = serde_path_to_error::deserialize(deserializer).map_err(|err| {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() { "<root>" } else { path.as_str() };
            LoadError::Translation(format!("catalog schema mismatch at {path}: {source}"))
        })?;

        Self::new(wire.drugs, wire.concepts)
    }

    /// Read and parse a catalog YAML file.
    pub fn load(path: &Path) -> LoadResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn drugs(&self) -> &[Drug] {
        &self.drugs
    }

    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }
}

impl ConceptService for InMemoryCatalog {
    fn drug_by_uuid(&self, uuid: &str) -> Option<Drug> {
        self.drugs.iter().find(|d| d.uuid == uuid).cloned()
    }

    fn drug_by_name_or_id(&self, name_or_id: &str) -> Option<Drug> {
        if let Ok(id) = name_or_id.parse::<DrugId>() {
            if let Some(drug) = self.drugs.iter().find(|d| d.id == id) {
                return Some(drug.clone());
            }
        }
        let wanted = name_or_id.trim().to_lowercase();
        self.drugs
            .iter()
            .find(|d| d.name.as_str().to_lowercase() == wanted)
            .cloned()
    }

    fn concept_by_uuid(&self, uuid: &str) -> Option<Concept> {
        self.concepts.iter().find(|c| c.uuid == uuid).cloned()
    }

    fn concept(&self, id: ConceptId) -> Option<Concept> {
        self.concepts.iter().find(|c| c.id == id).cloned()
    }

    fn concept_answers(&self, concept: &Concept) -> Vec<Concept> {
        concept
            .answers
            .iter()
            .filter_map(|answer| self.concept(*answer))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = r#"drugs:
  - id: 2
    uuid: 3cfcf118-931c-46f7-8ff6-7b876f0d4202
    name: Triomune-30
    concept: 792
    dose_strength: 1.0
concepts:
  - id: 792
    uuid: 792AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA
    name: Stavudine lamivudine and nevirapine
  - id: 1107
    uuid: 1107AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA
    name: Patient refused
"#;

    #[test]
    fn parses_catalog_yaml() {
        let catalog = InMemoryCatalog::from_yaml(CATALOG).expect("valid catalog");
        assert_eq!(catalog.drugs().len(), 1);
        assert_eq!(catalog.concepts().len(), 2);
        assert_eq!(catalog.drugs()[0].dose_strength, Some(1.0));
        assert_eq!(catalog.drugs()[0].minimum_daily_dose, None);
    }

    #[test]
    fn resolves_drug_by_id_name_and_uuid() {
        let catalog = InMemoryCatalog::from_yaml(CATALOG).expect("valid catalog");

        let by_id = catalog.drug_by_name_or_id("2").expect("by id");
        let by_name = catalog.drug_by_name_or_id("triomune-30").expect("by name");
        let by_uuid = catalog
            .drug_by_uuid("3cfcf118-931c-46f7-8ff6-7b876f0d4202")
            .expect("by uuid");

        assert_eq!(by_id, by_name);
        assert_eq!(by_id, by_uuid);
        assert!(catalog.drug_by_name_or_id("Aspirin").is_none());
    }

    #[test]
    fn rejects_unknown_fields_with_path() {
        let input = "drugs:\n  - id: 1\n    uuid: x\n    name: A\n    concept: 3\n    colour: red\n";

        let err = InMemoryCatalog::from_yaml(input).expect_err("should reject unknown field");
        match err {
            LoadError::Translation(msg) => assert!(msg.contains("drugs[0]"), "{msg}"),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_duplicate_drug_ids() {
        let input = r#"drugs:
  - { id: 1, uuid: a, name: A, concept: 3 }
  - { id: 1, uuid: b, name: B, concept: 3 }
"#;

        let err = InMemoryCatalog::from_yaml(input).expect_err("should reject duplicates");
        assert!(matches!(err, LoadError::DuplicateDrug(id) if id == DrugId::new(1)));
    }

    #[test]
    fn rejects_answers_to_unknown_concepts() {
        let input = r#"concepts:
  - { id: 10, uuid: a, name: Reason, answers: [11] }
"#;

        let err = InMemoryCatalog::from_yaml(input).expect_err("should reject dangling answer");
        assert!(matches!(
            err,
            LoadError::UnknownAnswer { concept, answer }
                if concept == ConceptId::new(10) && answer == ConceptId::new(11)
        ));
    }

    #[test]
    fn daily_dose_bounds_are_independent() {
        let mut drug = InMemoryCatalog::from_yaml(CATALOG).expect("valid").drugs()[0].clone();
        assert!(drug.accepts_daily_dose(1000.0));

        drug.minimum_daily_dose = Some(1.0);
        assert!(!drug.accepts_daily_dose(0.5));
        assert!(drug.accepts_daily_dose(1000.0));

        drug.minimum_daily_dose = None;
        drug.maximum_daily_dose = Some(2.0);
        assert!(drug.accepts_daily_dose(0.5));
        assert!(drug.accepts_daily_dose(2.0));
        assert!(!drug.accepts_daily_dose(2.5));
    }

    #[test]
    fn loads_catalog_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(CATALOG.as_bytes()).expect("write catalog");

        let catalog = InMemoryCatalog::load(file.path()).expect("load catalog");
        assert_eq!(catalog.drugs()[0].name.as_str(), "Triomune-30");
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = InMemoryCatalog::load(&dir.path().join("missing.yaml")).expect_err("missing");
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
