//! Collection domain - Entity kinds, their static descriptors and query parameters

mod catalog;
mod descriptor;
mod query;

pub use catalog::{EntityKind, DRUG_DOSAGE, DRUG_INTERACTIONS};
pub use descriptor::{slugify, CollectionDescriptor, ExtractFn, FetchSpec};
pub use query::QueryParameters;
