use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::{main_content, stripped_text};

static HEADINGS: Lazy<Selector> = Lazy::new(|| Selector::parse("h2, h3").unwrap());

static ORAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)oral:").unwrap());

static BOUNDARIES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)parenteral\s*(\([^)]+\))?:",
        r"(?i)rectal\s*:",
        r"(?i)comments?:",
        r"(?i)use:",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

const PEDIATRIC_RESTRICTED: &[&str] = &["alprazolam", "clonazepam"];

const MIN_DOSAGE_LENGTH: usize = 20;

/// Extracts the oral dosing text for an age group and symptom from a
/// drug dosage page
pub fn extract_dosage_info(
    html: Option<&str>,
    symptom: &str,
    age_group: &str,
    drug: &str,
) -> String {
    let Some(html) = html.filter(|h| !h.trim().is_empty()) else {
        return format!("No dosage information available for {}.", drug);
    };

    if PEDIATRIC_RESTRICTED.contains(&drug.to_lowercase().as_str()) && age_group == "pediatric" {
        return "Not recommended for patients under 18; consult a doctor.".to_string();
    }

    let document = Html::parse_document(html);
    let main = main_content(&document);

    let Some(heading) = find_section_heading(main, symptom, age_group) else {
        return format!("No dosage section found for {} and {}.", age_group, symptom);
    };

    debug!(heading = %stripped_text(&heading, " "), "Found dosage section");

    let section = oral_section(&section_text(heading));

    if section.chars().count() < MIN_DOSAGE_LENGTH || !has_dose_unit(&section) {
        return format!("No valid dosage found for {} and {}.", age_group, symptom);
    }

    section
}

fn find_section_heading<'a>(
    main: ElementRef<'a>,
    symptom: &str,
    age_group: &str,
) -> Option<ElementRef<'a>> {
    let title = format!("usual {} dose for {}", age_group, symptom).to_lowercase();
    let age_group = age_group.to_lowercase();
    let symptom = symptom.to_lowercase();

    let headings: Vec<(ElementRef<'a>, String)> = main
        .select(&HEADINGS)
        .map(|h| (h, stripped_text(&h, " ").to_lowercase()))
        .collect();

    headings
        .iter()
        .find(|(_, text)| text.contains(&title))
        .or_else(|| {
            headings.iter().find(|(_, text)| {
                text.contains("dose") && (text.contains(&age_group) || text.contains(&symptom))
            })
        })
        .map(|(heading, _)| *heading)
}

/// Text of the siblings following `heading` up to the next h2/h3, one
/// trimmed line per text fragment
fn section_text(heading: ElementRef<'_>) -> String {
    let mut lines: Vec<String> = Vec::new();

    for sibling in heading.next_siblings() {
        if let Some(element) = ElementRef::wrap(sibling) {
            let name = element.value().name();
            if matches!(name, "h2" | "h3") {
                break;
            }
            if name.starts_with('h') {
                continue;
            }
            lines.extend(element.text().map(|t| t.to_string()));
        } else if let Some(text) = sibling.value().as_text() {
            lines.push(text.to_string());
        }
    }

    lines
        .iter()
        .flat_map(|fragment| fragment.lines())
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Starts at the oral dosing block and stops at the first non-oral route
/// or commentary boundary
fn oral_section(text: &str) -> String {
    let oral = match ORAL.find(text) {
        Some(m) => &text[m.start()..],
        None => text,
    };

    let mut kept: Vec<&str> = Vec::new();

    for line in oral.lines() {
        if let Some(boundary) = BOUNDARIES.iter().find_map(|pattern| pattern.find(line)) {
            let before = line[..boundary.start()].trim();
            if !before.is_empty() {
                kept.push(before);
            }
            break;
        }
        kept.push(line);
    }

    kept.join("\n")
}

fn has_dose_unit(text: &str) -> bool {
    let lower = text.to_lowercase();
    ["mg", "mcg", "ml"].iter().any(|unit| lower.contains(unit))
}
