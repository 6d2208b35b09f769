//! Costwise Core - Domain Types
//!
//! Data structures, the error taxonomy and the pure affordability calculator.
//! All other crates depend on this one. No I/O happens here.

use serde::{Deserialize, Serialize};

mod account;
mod calculation;
mod calculator;
mod city;
mod clock;
mod error;
mod identity;

pub use account::*;
pub use calculation::*;
pub use calculator::*;
pub use city::*;
pub use clock::*;
pub use error::*;
pub use identity::*;

/// Entity type discriminator used in storage errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EntityType {
    CityCost,
    Calculation,
    User,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::CityCost => "city_cost",
            EntityType::Calculation => "calculation",
            EntityType::User => "user",
        }
    }
}
