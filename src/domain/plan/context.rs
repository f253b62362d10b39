//! Inputs to plan generation

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::text::{concise_dosage, display_name, dosage_for_patient, summarize_interaction};
use super::validation::{truncate_section, PlanSections};
use crate::domain::cache::CacheKeyParams;
use crate::domain::patient::PatientProfile;
use crate::domain::template::{render_template, TemplateError};

/// Instruction sent to the generation backend
pub const PLAN_PROMPT: &str = r#"
You are a doctor speaking to a parent. Generate a mitigation plan for a ${var:age}-year-old (${var:weight} kg) with ${var:symptom}. The plan must have exactly two paragraphs separated by a single newline, each under 400 characters.

**Dosage Paragraph:**
- Start with "Hello!"
- Include precise dosing for ${var:drugA} and ${var:drugB} using the exact details below.
- End with "Follow doctor’s advice!"

**Interactions Paragraph:**
- Start with "Caution! "
- Summarize food/alcohol interactions using the exact details below. If none, state "No interactions."
- End with "Consult a doctor!"

**Input:**
- ${var:drugA} Dosage: ${var:drugADosage}
- ${var:drugA} Interactions: ${var:drugAInteractions}
- ${var:drugB} Dosage: ${var:drugBDosage}
- ${var:drugB} Interactions: ${var:drugBInteractions}
"#;

/// Retrieved dosage and interaction text for one drug
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugFindings {
    pub name: String,
    pub dosage: String,
    pub interactions: String,
}

impl DrugFindings {
    pub fn new(
        name: impl Into<String>,
        dosage: impl Into<String>,
        interactions: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            dosage: dosage.into(),
            interactions: interactions.into(),
        }
    }
}

/// Condensed per-drug text fed to the prompt and the fallback plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrugSummary {
    pub display_name: String,
    pub dosage: String,
    pub interactions: String,
}

/// A patient plus findings for the two suggested drugs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanContext {
    pub patient: PatientProfile,
    pub drugs: [DrugFindings; 2],
}

impl PlanContext {
    pub fn new(patient: PatientProfile, first: DrugFindings, second: DrugFindings) -> Self {
        Self {
            patient,
            drugs: [first, second],
        }
    }

    pub fn summaries(&self) -> [DrugSummary; 2] {
        self.drugs.clone().map(|drug| {
            let display_name = display_name(&drug.name);
            let line = dosage_for_patient(
                &display_name,
                &drug.dosage,
                self.patient.weight,
                self.patient.age,
            );

            DrugSummary {
                dosage: concise_dosage(&line),
                interactions: summarize_interaction(&drug.interactions, &display_name),
                display_name,
            }
        })
    }

    /// Key parameters covering the full clinical input
    pub fn cache_params(&self) -> CacheKeyParams {
        CacheKeyParams::new(&self.patient.symptom)
            .with_component("age", self.patient.age.to_string())
            .with_component("weight", self.patient.weight_label())
            .with_component("drug_a", display_name(&self.drugs[0].name))
            .with_component("drug_b", display_name(&self.drugs[1].name))
    }

    pub fn prompt(&self) -> Result<String, TemplateError> {
        let [a, b] = self.summaries();

        let values: HashMap<String, String> = [
            ("age", self.patient.age.to_string()),
            ("weight", self.patient.weight_label()),
            ("symptom", self.patient.symptom.clone()),
            ("drugA", a.display_name),
            ("drugADosage", a.dosage),
            ("drugAInteractions", a.interactions),
            ("drugB", b.display_name),
            ("drugBDosage", b.dosage),
            ("drugBInteractions", b.interactions),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        render_template(PLAN_PROMPT, &values)
    }

    /// Plan synthesized from the condensed text alone
    pub fn fallback(&self) -> PlanSections {
        let [a, b] = self.summaries();

        let dosage = format!(
            "Hello! For your {}-year-old with {}, give {} ({}) or {} ({}). Follow doctor’s advice!",
            self.patient.age, self.patient.symptom, a.display_name, a.dosage, b.display_name, b.dosage
        );
        let interactions = format!(
            "Caution! {}: {} {}: {} Consult a doctor!",
            a.display_name, a.interactions, b.display_name, b.interactions
        );

        PlanSections {
            dosage: truncate_section(&dosage),
            interactions: truncate_section(&interactions),
        }
    }
}
