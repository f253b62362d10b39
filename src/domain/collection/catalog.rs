//! The closed set of entity kinds

use serde::{Deserialize, Serialize};

use super::descriptor::{CollectionDescriptor, FetchSpec};
use crate::domain::extraction::{extract_dosage_info, extract_food_interaction_info};

fn arg<'a>(args: &[&'a str], index: usize) -> &'a str {
    args.get(index).copied().unwrap_or_default()
}

fn extract_dosage(content: Option<&str>, args: &[&str]) -> String {
    extract_dosage_info(content, arg(args, 0), arg(args, 1), arg(args, 2))
}

fn extract_interactions(content: Option<&str>, _args: &[&str]) -> String {
    extract_food_interaction_info(content)
}

pub static DRUG_DOSAGE: CollectionDescriptor = CollectionDescriptor {
    name: "DrugDosage",
    filter_fields: &["drugName", "symptom", "ageGroup"],
    query_fields: &["drugName", "symptom", "ageGroup", "dosage"],
    result_field: "dosage",
    cache_key_template: "dosage:${var:drugName}:${var:symptom}:${var:ageGroup}",
    fetch: FetchSpec {
        url_template: "https://www.drugs.com/dosage/${var:drug}.html",
        extract_params: &["symptom", "ageGroup", "drugName"],
        extract: extract_dosage,
    },
};

pub static DRUG_INTERACTIONS: CollectionDescriptor = CollectionDescriptor {
    name: "DrugInteractions",
    filter_fields: &["drugName"],
    query_fields: &["drugName", "interactions"],
    result_field: "interactions",
    cache_key_template: "interactions:${var:drugName}",
    fetch: FetchSpec {
        url_template: "https://www.drugs.com/food-interactions/${var:drug}.html",
        extract_params: &["drugName"],
        extract: extract_interactions,
    },
};

/// Entity kinds served by the retrieval service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Dosage,
    Interactions,
}

impl EntityKind {
    pub const ALL: [EntityKind; 2] = [EntityKind::Dosage, EntityKind::Interactions];

    pub fn descriptor(&self) -> &'static CollectionDescriptor {
        match self {
            Self::Dosage => &DRUG_DOSAGE,
            Self::Interactions => &DRUG_INTERACTIONS,
        }
    }

    pub fn all_descriptors() -> Vec<&'static CollectionDescriptor> {
        Self::ALL.iter().map(|kind| kind.descriptor()).collect()
    }
}
