pub mod app;
pub mod config;
pub mod context;
pub mod error;
pub mod filter;
pub mod idempotency;
pub mod memory;
pub mod metrics;
pub mod models;
pub mod orchestrator;
pub mod payment_handlers;
pub mod processor;
pub mod validation;

pub use app::{build_router, AppState};
pub use config::GatewayConfig;
pub use error::{GatewayError, Operation};
pub use memory::InMemoryProcessor;
pub use orchestrator::PaymentOrchestrator;
pub use processor::{PaymentProcessor, ProcessorError, ProcessorResult};
