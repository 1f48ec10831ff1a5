pub mod anomaly_detector;
pub mod chat_service;
pub mod cost_estimator;
pub mod guardrail;
pub mod usage_store;
pub mod usage_tracker;
