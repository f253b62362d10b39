//! Infrastructure services

mod plan_service;
mod retrieval_service;

pub use plan_service::{GeneratedPlan, PlanService, PlanSource, PLAN_ATTEMPTS, PLAN_BACKOFF_FACTOR};
pub use retrieval_service::{RetrievalService, DEFAULT_HYBRID_ALPHA};
