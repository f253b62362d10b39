//! Retrieval domain - Results of the tiered lookup and the validity gate

mod result;
mod validity;

pub use result::{PayloadKind, RetrievalResult, Tier};
pub use validity::{is_valid_payload, MIN_VALID_LENGTH};
