//! Money Commander
//!
//! A guided five-screen financial literacy wizard:
//! - Collects income, bills and spending leaks and computes the surplus
//! - Walks the user through protection, SIP planning and a risk quiz
//! - Gates every "continue" on the screen's required inputs
//! - Consults remote advisor agents without ever blocking on them
//! - Persists the whole session to one durable slot
//!
//! FLOW:
//! LANDING → INTEL → SHIELD → DEPLOYMENT → RECON → BATTLE PLAN

pub mod api;
pub mod calculator;
pub mod classifier;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod gate;
pub mod gateway;
pub mod message_log;
pub mod models;
pub mod report;
pub mod runtime;
pub mod state;
pub mod wizard;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use classifier::RiskProfileClassifier;
pub use runtime::{FieldInput, SessionRuntime};
pub use wizard::{WizardConfig, WizardController};
