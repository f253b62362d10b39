//! Pure text helpers that condense retrieved dosage and interaction text

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::patient::AgeGroup;

static MG_PER_KG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+\s*to\s*\d+\s*mg/kg|\d+\s*mg/kg)").unwrap());

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

static FREQUENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(every\s*\d+\s*to\s*\d+\s*hours|every\s*\d+\s*hours)").unwrap()
});

static DAILY_MAXIMUM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(not to exceed\s*\d+\s*doses\s*in\s*24\s*hours)").unwrap()
});

static DOSE_AND_FREQUENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\d+\s*(?:to\s*\d+\s*)?(?:mg|ml)).*?(every\s*\d+\s*(?:to\s*\d+\s*)?hours.*?not to exceed\s*\d+\s*doses\s*in\s*24\s*hours)",
    )
    .unwrap()
});

static PER_DAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)in\s*24\s*hours").unwrap());

/// "ibuprofen" -> "Ibuprofen"
pub fn display_name(drug: &str) -> String {
    let lower = drug.to_lowercase();
    let mut chars = lower.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Picks the dosing line that applies to a patient.
///
/// Pediatric patients with a known weight get the first mg/kg line scaled to
/// their weight; everyone else gets the first line naming a dose, a
/// frequency and a daily maximum.
pub fn dosage_for_patient(drug: &str, dosage_text: &str, weight: Option<f64>, age: u32) -> String {
    if dosage_text.trim().is_empty() || dosage_text.to_lowercase().contains("no dosage") {
        return format!("No dosage information available for {}.", drug);
    }

    let lines: Vec<&str> = dosage_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let weight = weight.filter(|w| *w > 0.0);
    let age_group = AgeGroup::for_age(age);

    if let (AgeGroup::Pediatric, Some(weight)) = (age_group, weight) {
        if let Some(dose) = lines.iter().find_map(|line| weight_based_dose(line, weight)) {
            return dose;
        }
        return format!("No specific dosage found for {} at age {}.", drug, age);
    }

    lines
        .iter()
        .find_map(|line| DOSE_AND_FREQUENCY.find(line))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| format!("No specific dosage found for {} at age {}.", drug, age))
}

fn weight_based_dose(line: &str, weight: f64) -> Option<String> {
    let per_kg = MG_PER_KG.find(line)?.as_str();
    let doses: Vec<f64> = NUMBER
        .find_iter(per_kg)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();

    let dose = match doses.as_slice() {
        [single] => format!("{} mg", (single * weight) as i64),
        [low, high, ..] => format!("{} to {} mg", (low * weight) as i64, (high * weight) as i64),
        [] => return None,
    };

    let frequency = FREQUENCY
        .find(line)
        .map(|m| m.as_str())
        .unwrap_or("as needed");
    let maximum = DAILY_MAXIMUM.find(line).map(|m| m.as_str()).unwrap_or("");

    Some(format!("{} {} {}", dose, frequency, maximum).trim().to_string())
}

/// Shortens a dosing line to "<dose> every N hours max N doses day", or
/// returns it unchanged when it has no such shape
pub fn concise_dosage(line: &str) -> String {
    match DOSE_AND_FREQUENCY.captures(line) {
        Some(caps) => {
            let frequency = caps[2].replace("not to exceed", "max");
            let frequency = PER_DAY.replace_all(&frequency, "day");
            format!("{} {}", &caps[1], frequency)
        }
        None => line.to_string(),
    }
}

/// Canned one-line summary of an interaction text
pub fn summarize_interaction(interaction_text: &str, drug: &str) -> String {
    let text = interaction_text.to_lowercase();
    let drug = drug.to_lowercase();

    if text.contains("no food/alcohol interactions found") {
        return "No interactions.".to_string();
    }

    let mut summary = Vec::new();

    if text.contains("alcohol") {
        summary.push(if drug.contains("acetaminophen") {
            "Avoid alcohol; liver risk."
        } else if drug.contains("ibuprofen") || drug.contains("aspirin") {
            "Avoid alcohol; stomach bleeding."
        } else {
            "Avoid alcohol; sedation risk."
        });
    }

    if text.contains("high blood pressure") || text.contains("hypertension") {
        summary.push("Use cautiously with hypertension.");
    }

    if summary.is_empty() {
        "Check with doctor.".to_string()
    } else {
        summary.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADULT_TEXT: &str = "Oral:\n325 to 650 mg orally every 4 to 6 hours as needed, not to exceed 4 doses in 24 hours\nRectal: see label";

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("ibuprofen"), "Ibuprofen");
        assert_eq!(display_name("BISMUTH subsalicylate"), "Bismuth subsalicylate");
        assert_eq!(display_name(""), "");
    }

    #[test]
    fn test_adult_dose_line() {
        assert_eq!(
            dosage_for_patient("Acetaminophen", ADULT_TEXT, Some(70.0), 30),
            "325 to 650 mg orally every 4 to 6 hours as needed, not to exceed 4 doses in 24 hours"
        );
    }

    #[test]
    fn test_pediatric_weight_based_dose() {
        let text = "Oral: 10 to 15 mg/kg every 4 to 6 hours as needed; not to exceed 5 doses in 24 hours";

        assert_eq!(
            dosage_for_patient("Acetaminophen", text, Some(20.0), 8),
            "200 to 300 mg every 4 to 6 hours not to exceed 5 doses in 24 hours"
        );
    }

    #[test]
    fn test_pediatric_single_mg_per_kg_without_frequency() {
        assert_eq!(
            dosage_for_patient("Ibuprofen", "Oral: 10 mg/kg once", Some(12.5), 4),
            "125 mg as needed"
        );
    }

    #[test]
    fn test_pediatric_dose_truncates_double_precision_product() {
        let text = "Oral: 15 mg/kg every 4 to 6 hours";

        assert_eq!(dosage_for_patient("Acetaminophen", text, Some(4.2), 1), "63 mg every 4 to 6 hours");
        assert_eq!(dosage_for_patient("Acetaminophen", text, Some(8.2), 2), "122 mg every 4 to 6 hours");
        assert_eq!(dosage_for_patient("Acetaminophen", text, Some(8.4), 2), "126 mg every 4 to 6 hours");
        assert_eq!(dosage_for_patient("Acetaminophen", text, Some(16.4), 5), "245 mg every 4 to 6 hours");
    }

    #[test]
    fn test_pediatric_without_weight_uses_general_line() {
        assert_eq!(
            dosage_for_patient("Acetaminophen", ADULT_TEXT, None, 8),
            "325 to 650 mg orally every 4 to 6 hours as needed, not to exceed 4 doses in 24 hours"
        );
    }

    #[test]
    fn test_missing_dosage() {
        assert_eq!(
            dosage_for_patient("Aspirin", "No dosage information available for aspirin.", None, 30),
            "No dosage information available for Aspirin."
        );
        assert_eq!(
            dosage_for_patient("Aspirin", "Take as directed by the label", None, 30),
            "No specific dosage found for Aspirin at age 30."
        );
    }

    #[test]
    fn test_concise_dosage() {
        assert_eq!(
            concise_dosage(
                "325 to 650 mg orally every 4 to 6 hours as needed, not to exceed 4 doses in 24 hours"
            ),
            "325 to 650 mg every 4 to 6 hours as needed, max 4 doses day"
        );
        assert_eq!(concise_dosage("No specific dosage"), "No specific dosage");
    }

    #[test]
    fn test_summarize_interaction() {
        assert_eq!(
            summarize_interaction("No food/alcohol interactions found.", "Aspirin"),
            "No interactions."
        );
        assert_eq!(
            summarize_interaction("Major Interaction: Alcohol (Ethanol)", "Acetaminophen"),
            "Avoid alcohol; liver risk."
        );
        assert_eq!(
            summarize_interaction("Alcohol and high blood pressure", "Ibuprofen"),
            "Avoid alcohol; stomach bleeding. Use cautiously with hypertension."
        );
        assert_eq!(
            summarize_interaction("Alcohol may add to drowsiness", "Lorazepam"),
            "Avoid alcohol; sedation risk."
        );
        assert_eq!(summarize_interaction("Grapefruit juice", "Amlodipine"), "Check with doctor.");
    }
}
