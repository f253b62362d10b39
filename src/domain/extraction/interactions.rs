use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::{main_content, stripped_text};

static BLOCKS: Lazy<Selector> = Lazy::new(|| Selector::parse("div.interactions-reference").unwrap());
static SEVERITY: Lazy<Selector> = Lazy::new(|| Selector::parse("span.ddc-status-label").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h3").unwrap());
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

const PROFESSIONAL_ONLY: &str =
    "information for this minor interaction is available on the professional version";

/// Summarizes the food and alcohol interaction blocks of a drug page
pub fn extract_food_interaction_info(html: Option<&str>) -> String {
    let Some(html) = html.filter(|h| !h.trim().is_empty()) else {
        return "No food/alcohol interactions found.".to_string();
    };

    let document = Html::parse_document(html);
    let blocks: Vec<ElementRef<'_>> = main_content(&document).select(&BLOCKS).collect();

    if blocks.is_empty() {
        return "No food/alcohol interactions found.".to_string();
    }

    let parts: Vec<String> = blocks.into_iter().filter_map(render_block).collect();

    if parts.is_empty() {
        "No relevant food/alcohol interactions found.".to_string()
    } else {
        parts.join("\n\n")
    }
}

fn render_block(block: ElementRef<'_>) -> Option<String> {
    let severity = block
        .select(&SEVERITY)
        .next()
        .map(|s| stripped_text(&s, ""))
        .unwrap_or_else(|| "Unknown".to_string());

    let title_element = block.select(&TITLE).next();
    let title = title_element
        .map(|t| stripped_text(&t, ""))
        .unwrap_or_else(|| "Unknown Interaction".to_string());

    let description = description(block, title_element);

    if description.is_empty() || description.to_lowercase() == PROFESSIONAL_ONLY {
        return None;
    }

    Some(format!("{} Interaction: {}\n{}", severity, title, description))
}

fn description(block: ElementRef<'_>, title: Option<ElementRef<'_>>) -> String {
    let children = || block.children().filter_map(ElementRef::wrap);

    let paragraph = children()
        .find(|child| child.value().name() == "p")
        .or_else(|| block.select(&PARAGRAPH).next());

    if let Some(paragraph) = paragraph {
        return stripped_text(&paragraph, "");
    }

    children()
        .filter(|child| Some(child.id()) != title.map(|t| t.id()))
        .filter(|child| child.value().name() != "div")
        .map(|child| stripped_text(&child, ""))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
