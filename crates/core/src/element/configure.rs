use super::{
    DoseFrequencyFields, DrugCatalogEntry, DrugOrderElement, DrugSelector, InstructionsField,
    SelectorChoice, SelectorStyle,
};
use crate::catalog::{Concept, ConceptService, Drug};
use crate::constants::{
    DOSE_MAX, DOSE_MIN, PARAM_CHECKBOX, PARAM_DISCONTINUED_REASON, PARAM_DRUG_LABELS,
    PARAM_DRUG_NAMES, PARAM_HIDE_DOSE_AND_FREQUENCY, PARAM_INSTRUCTIONS_LABEL,
    PARAM_VALIDATE_DOSE,
};
use crate::context::FormContext;
use crate::error::{ConfigurationError, ConfigurationResult};
use crate::frequency::{DAYS_PER_WEEK, TIMES_PER_DAY};
use crate::messages::codes;
use crate::widget::{
    CheckboxWidget, DateWidget, DropdownWidget, NumberFieldWidget, SelectOption, TextFieldWidget,
    WidgetBinding,
};
use rxform_types::ConceptId;
use rxform_uuid::looks_like_uuid;
use std::collections::BTreeMap;

/// The concept whose answers are offered as discontinuation reasons.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscontinuedReasonConfig {
    pub concept: Concept,
    /// Never empty.
    pub answers: Vec<Concept>,
}

impl DiscontinuedReasonConfig {
    pub fn contains_answer(&self, id: ConceptId) -> bool {
        self.answers.iter().any(|answer| answer.id == id)
    }
}

/// Validated, immutable view of the author's parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldConfiguration {
    entries: Vec<DrugCatalogEntry>,
    choices: Vec<SelectorChoice>,
    selector_style: SelectorStyle,
    hide_dose_and_frequency: bool,
    validate_dose: bool,
    instructions_label: Option<String>,
    discontinued_reason: Option<DiscontinuedReasonConfig>,
}

enum Token {
    Drug(Drug),
    Placeholder(String),
}

impl FieldConfiguration {
    pub fn from_parameters(
        parameters: &BTreeMap<String, String>,
        catalog: &dyn ConceptService,
    ) -> ConfigurationResult<Self> {
        let drug_names = parameters
            .get(PARAM_DRUG_NAMES)
            .map(|raw| raw.trim())
            .filter(|raw| !raw.is_empty())
            .ok_or(ConfigurationError::MissingDrugNames)?;

        let tokens = drug_names
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| resolve_token(token, catalog))
            .collect::<ConfigurationResult<Vec<_>>>()?;

        let drug_count = tokens
            .iter()
            .filter(|token| matches!(token, Token::Drug(_)))
            .count();
        if drug_count == 0 {
            return Err(ConfigurationError::NoDrugsResolved(drug_names.to_string()));
        }

        let labels: Option<Vec<String>> = parameters.get(PARAM_DRUG_LABELS).map(|raw| {
            let mut labels: Vec<String> = raw
                .split(',')
                .map(|label| label.trim().to_string())
                .collect();
            // A trailing comma does not add a label.
            while labels.last().is_some_and(String::is_empty) {
                labels.pop();
            }
            labels
        });
        if let Some(labels) = &labels {
            if labels.len() != drug_count {
                return Err(ConfigurationError::DrugLabelCountMismatch {
                    labels: labels.len(),
                    drugs: drug_count,
                });
            }
        }

        let mut entries = Vec::with_capacity(drug_count);
        let mut choices = vec![SelectorChoice::Blank];
        for token in tokens {
            match token {
                Token::Drug(drug) => {
                    let position = entries.len();
                    let label = labels
                        .as_ref()
                        .and_then(|labels| labels.get(position).cloned())
                        .unwrap_or_else(|| drug.name.to_string());
                    choices.push(SelectorChoice::Drug {
                        id: drug.id,
                        label: label.clone(),
                    });
                    entries.push(DrugCatalogEntry {
                        drug,
                        label,
                        position,
                    });
                }
                Token::Placeholder(label) => choices.push(SelectorChoice::Placeholder { label }),
            }
        }

        let selector_style = match (flag(parameters, PARAM_CHECKBOX), entries.len()) {
            (true, 1) => SelectorStyle::Checkbox,
            (true, count) => {
                tracing::warn!(
                    drugs = count,
                    "checkbox requested for more than one drug; rendering a dropdown instead"
                );
                SelectorStyle::Dropdown
            }
            (false, _) => SelectorStyle::Dropdown,
        };

        let discontinued_reason = parameters
            .get(PARAM_DISCONTINUED_REASON)
            .map(|reference| resolve_reason_concept(reference.trim(), catalog))
            .transpose()?;

        Ok(Self {
            entries,
            choices,
            selector_style,
            hide_dose_and_frequency: flag(parameters, PARAM_HIDE_DOSE_AND_FREQUENCY),
            validate_dose: flag(parameters, PARAM_VALIDATE_DOSE),
            instructions_label: parameters
                .get(PARAM_INSTRUCTIONS_LABEL)
                .map(|label| label.trim().to_string()),
            discontinued_reason,
        })
    }

    /// Configured drugs, in configuration order.
    pub fn entries(&self) -> &[DrugCatalogEntry] {
        &self.entries
    }

    /// Dropdown choices: the blank default, then drugs and placeholders in configuration order.
    pub fn choices(&self) -> &[SelectorChoice] {
        &self.choices
    }

    pub fn selector_style(&self) -> SelectorStyle {
        self.selector_style
    }

    pub fn hides_dose_and_frequency(&self) -> bool {
        self.hide_dose_and_frequency
    }

    pub fn validates_dose(&self) -> bool {
        self.validate_dose
    }

    pub fn instructions_label(&self) -> Option<&str> {
        self.instructions_label.as_deref()
    }

    pub fn discontinued_reason(&self) -> Option<&DiscontinuedReasonConfig> {
        self.discontinued_reason.as_ref()
    }

    /// The configured entry whose drug id is `value`.
    pub fn entry_for_value(&self, value: &str) -> Option<&DrugCatalogEntry> {
        let id = value.parse().ok()?;
        self.entries.iter().find(|entry| entry.drug.id == id)
    }
}

fn flag(parameters: &BTreeMap<String, String>, key: &str) -> bool {
    parameters
        .get(key)
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
}

fn resolve_token(token: &str, catalog: &dyn ConceptService) -> ConfigurationResult<Token> {
    let drug = if looks_like_uuid(token) {
        catalog.drug_by_uuid(token)
    } else {
        catalog.drug_by_name_or_id(token)
    };
    if let Some(drug) = drug {
        return Ok(Token::Drug(drug));
    }
    token
        .strip_prefix('/')
        .and_then(|rest| rest.strip_suffix('/'))
        .map(|label| Token::Placeholder(label.to_string()))
        .ok_or_else(|| ConfigurationError::UnknownDrug(token.to_string()))
}

fn resolve_reason_concept(
    reference: &str,
    catalog: &dyn ConceptService,
) -> ConfigurationResult<DiscontinuedReasonConfig> {
    let concept = catalog
        .concept_by_uuid(reference)
        .or_else(|| {
            reference
                .parse::<ConceptId>()
                .ok()
                .and_then(|id| catalog.concept(id))
        })
        .ok_or_else(|| ConfigurationError::UnknownDiscontinuedReasonConcept(reference.to_string()))?;

    let answers = catalog.concept_answers(&concept);
    if answers.is_empty() {
        return Err(ConfigurationError::DiscontinuedReasonWithoutAnswers(
            concept.name.to_string(),
        ));
    }
    Ok(DiscontinuedReasonConfig { concept, answers })
}

impl DrugOrderElement {
    /// Registers the element's widgets in field order: drug, start date, dose, frequency,
    /// frequency per week, discontinued date, discontinued reason, instructions.
    pub(super) fn register(ctx: &mut FormContext, config: FieldConfiguration) -> Self {
        let drug = match (config.selector_style(), config.entries()) {
            (SelectorStyle::Checkbox, [entry]) => {
                let (label, value) = (entry.label.clone(), entry.drug.id.to_string());
                DrugSelector::Checkbox(WidgetBinding::register(ctx, |id| {
                    CheckboxWidget::new(id, label, value)
                }))
            }
            _ => {
                let options = config.choices().iter().map(SelectorChoice::to_option).collect();
                DrugSelector::Dropdown(WidgetBinding::register(ctx, |id| {
                    DropdownWidget::new(id, options)
                }))
            }
        };

        let start_date = WidgetBinding::register(ctx, DateWidget::new);

        let dose_frequency = (!config.hides_dose_and_frequency()).then(|| {
            let dose = WidgetBinding::register(ctx, |id| {
                NumberFieldWidget::new(id, DOSE_MIN, DOSE_MAX, true)
            });

            let day = ctx.message(codes::FREQUENCY_DAY);
            let per_day = TIMES_PER_DAY
                .map(|times| SelectOption::new(format!("{times}/{day}"), times.to_string()))
                .collect();
            let frequency = WidgetBinding::register(ctx, |id| DropdownWidget::new(id, per_day));

            let days = ctx.message(codes::FREQUENCY_DAYS);
            let week = ctx.message(codes::FREQUENCY_WEEK);
            let per_week = DAYS_PER_WEEK
                .rev()
                .map(|count| SelectOption::new(format!("{count} {days}/{week}"), count.to_string()))
                .collect();
            let frequency_week =
                WidgetBinding::register(ctx, |id| DropdownWidget::new(id, per_week));

            DoseFrequencyFields {
                dose,
                frequency,
                frequency_week,
            }
        });

        let discontinued_date = WidgetBinding::register(ctx, DateWidget::new);

        let discontinued_reason = config.discontinued_reason().map(|reason| {
            let options = std::iter::once(SelectOption::new("", ""))
                .chain(reason.answers.iter().map(|answer| {
                    SelectOption::new(answer.name.to_string(), answer.id.to_string())
                }))
                .collect();
            WidgetBinding::register(ctx, |id| DropdownWidget::new(id, options))
        });

        let instructions = config.instructions_label().map(|label| InstructionsField {
            label: label.to_string(),
            binding: WidgetBinding::register(ctx, TextFieldWidget::new),
        });

        Self {
            config,
            drug,
            start_date,
            dose_frequency,
            discontinued_date,
            discontinued_reason,
            instructions,
            bound_order: None,
        }
    }
}
