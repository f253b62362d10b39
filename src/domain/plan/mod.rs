//! Plan domain - Mitigation plan inputs, format contract and text helpers

mod context;
mod text;
mod validation;

pub use context::{DrugFindings, DrugSummary, PlanContext, PLAN_PROMPT};
pub use text::{concise_dosage, display_name, dosage_for_patient, summarize_interaction};
pub use validation::{
    parse_plan, strip_role_markers, truncate_section, PlanSections, PlanValidationError,
    CAUTION, DOSAGE_CLOSING, GREETING, INTERACTION_CLOSING, MAX_SECTION_CHARS,
};
