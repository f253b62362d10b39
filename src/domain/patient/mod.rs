//! Patient domain - Patient profile, age groups and the symptom catalog

mod entity;
mod symptom;

pub use entity::{AgeGroup, PatientProfile, MAX_AGE, MAX_WEIGHT_KG};
pub use symptom::{sanitize_input, SymptomCatalog};
