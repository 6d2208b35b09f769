//! OpenAPI Specification for the Costwise API
//!
//! Generated by utoipa from the route annotations and schema derives.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{ApiError, ErrorCode};
use crate::routes::{accounts, calculate, calculations, cities, cost, dev_auth, health};
use crate::telemetry::metrics;
use crate::types::*;

use costwise_core::{Affordability, Breakdown, CalculationRecord, CityCostRecord, OwnerId};

/// OpenAPI document for the Costwise API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Costwise API",
        version = "0.1.0",
        description = "Salary versus cost-of-living comparisons with a per-user calculation history",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:5000", description = "Local Development")
    ),
    tags(
        (name = "Accounts", description = "Registration and password login"),
        (name = "Cities", description = "Cached cities, prefix search and manual cost index upserts"),
        (name = "Cost", description = "Per-city cost indices, refreshed from the pricing source"),
        (name = "Calculate", description = "Affordability breakdowns"),
        (name = "Calculations", description = "The caller's saved calculation history"),
        (name = "Health", description = "Liveness and readiness checks"),
        (name = "Observability", description = "Prometheus metrics"),
        (name = "Auth", description = "Development token issuance")
    ),
    paths(
        // === Account Routes ===
        accounts::register,
        accounts::login,

        // === Cost Index Routes ===
        cities::list_cities,
        cities::search_cities,
        cities::upsert_city,
        cost::get_city_cost,

        // === Calculator Routes ===
        calculate::calculate_affordability,

        // === Ledger Routes ===
        calculations::save_calculation,
        calculations::list_calculations,
        calculations::update_calculation,
        calculations::delete_calculation,

        // === Operational Routes ===
        health::ping,
        health::liveness,
        health::readiness,
        metrics::metrics_handler,
        dev_auth::generate_dev_token,
    ),
    components(
        schemas(
            // === Error Types ===
            ApiError, ErrorCode,

            // === Request / Response Types ===
            RegisterRequest, RegisterResponse, LoginRequest, LoginResponse,
            CitiesResponse, CitySearchResult, CostLevel, CityUpsertRequest, CalculateRequest,
            SaveCalculationRequest, UpdateCalculationRequest,
            DeleteCalculationRequest, DeleteCalculationResponse,
            DevTokenRequest, DevTokenResponse,

            // === Health Types ===
            health::HealthResponse, health::HealthStatus, health::HealthDetails,
            health::ComponentHealth, health::CacheHealth,

            // === Domain Types ===
            CityCostRecord, Breakdown, CalculationRecord, Affordability, OwnerId
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security scheme modifier for OpenAPI document.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            );
        }
    }
}

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        let openapi = Self::openapi();
        serde_json::to_string_pretty(&openapi)
    }
}
