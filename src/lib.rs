pub mod balance;
pub mod config;
pub mod enclosure;
pub mod engine;
pub mod error;
pub mod facility;
pub mod profile;
pub mod report;
pub mod request;
pub mod transport;
pub mod web;

pub use config::ServiceConfig;
pub use engine::AllocationEngine;
pub use error::{AllocationError, FacilityError};
pub use report::{AllocationResult, Plan};
pub use request::{AllocationRequest, EnclosureInput};
