use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

pub const MAX_AGE: u32 = 120;
pub const MAX_WEIGHT_KG: f64 = 300.0;

const ADULT_AGE: u32 = 18;

/// Dosing age group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeGroup {
    Pediatric,
    Adult,
}

impl AgeGroup {
    pub fn for_age(age: u32) -> Self {
        if age < ADULT_AGE {
            Self::Pediatric
        } else {
            Self::Adult
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pediatric => "pediatric",
            Self::Adult => "adult",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeGroup {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pediatric" => Ok(Self::Pediatric),
            "adult" => Ok(Self::Adult),
            other => Err(DomainError::validation(format!(
                "Unknown age group '{}', expected 'pediatric' or 'adult'",
                other
            ))),
        }
    }
}

/// A validated patient description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    /// Canonical symptom name
    pub symptom: String,
    /// Age in whole years
    pub age: u32,
    /// Weight in kilograms, when known
    pub weight: Option<f64>,
}

impl PatientProfile {
    pub fn new(symptom: impl Into<String>, age: u32, weight: Option<f64>) -> Result<Self, DomainError> {
        let symptom = symptom.into().trim().to_lowercase();

        if symptom.is_empty() {
            return Err(DomainError::validation("Symptom is required"));
        }

        if age > MAX_AGE {
            return Err(DomainError::validation(format!(
                "Age must be between 0 and {}",
                MAX_AGE
            )));
        }

        if let Some(weight) = weight {
            if !weight.is_finite() || weight <= 0.0 || weight > MAX_WEIGHT_KG {
                return Err(DomainError::validation(format!(
                    "Weight must be greater than 0 and at most {} kg",
                    MAX_WEIGHT_KG
                )));
            }
        }

        Ok(Self {
            symptom,
            age,
            weight,
        })
    }

    pub fn age_group(&self) -> AgeGroup {
        AgeGroup::for_age(self.age)
    }

    /// Weight for display and keys; "unknown" when absent
    pub fn weight_label(&self) -> String {
        self.weight
            .map(|w| w.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}
