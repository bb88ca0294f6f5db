//! Request/response types for the heroes API.
//!
//! Each endpoint has its own projection: list endpoints return summaries, and
//! detail endpoints nest the other side of the association exactly one level
//! deep. Request fields are optional so that missing values surface as
//! validation errors instead of extractor rejections.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateHeroRequest {
    pub name: Option<String>,
    pub super_name: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateHeroRequest {
    pub name: Option<String>,
    pub super_name: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreatePowerRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePowerRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateHeroPowerRequest {
    pub strength: Option<String>,
    pub hero_id: Option<i64>,
    pub power_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct HeroSummary {
    pub id: i64,
    pub name: String,
    pub super_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PowerSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// A hero with its associations; each association carries the power, never the hero again.
#[derive(Debug, Serialize, ToSchema)]
pub struct HeroDetail {
    pub id: i64,
    pub name: String,
    pub super_name: String,
    pub hero_powers: Vec<HeroPowerWithPower>,
}

/// A power with its associations; each association carries the hero, never the power again.
#[derive(Debug, Serialize, ToSchema)]
pub struct PowerDetail {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub hero_powers: Vec<HeroPowerWithHero>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HeroPowerWithPower {
    pub id: i64,
    pub strength: Strength,
    pub hero_id: i64,
    pub power_id: i64,
    pub power: PowerSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HeroPowerWithHero {
    pub id: i64,
    pub strength: Strength,
    pub hero_id: i64,
    pub power_id: i64,
    pub hero: HeroSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HeroPowerResponse {
    pub id: i64,
    pub strength: Strength,
    pub hero_id: i64,
    pub power_id: i64,
    pub hero: HeroSummary,
    pub power: PowerSummary,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidationErrorResponse {
    pub errors: Vec<String>,
}

/// How strongly a hero wields a power.
///
/// Stored as its variant name in `hero_powers.strength`; the table carries a
/// matching `CHECK` constraint.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
pub enum Strength {
    Strong,
    Weak,
    Average,
}

impl Strength {
    pub const ALL: [Self; 3] = [Self::Strong, Self::Weak, Self::Average];

    /// Returns the canonical string used in API payloads and SQL writes.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strong => "Strong",
            Self::Weak => "Weak",
            Self::Average => "Average",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|strength| strength.as_str() == value)
    }
}

/// Validated input for inserting a hero.
#[derive(Debug, PartialEq, Eq)]
pub struct NewHero {
    pub name: String,
    pub super_name: String,
}

/// Validated partial update for a hero; `None` keeps the stored value.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct HeroChanges {
    pub name: Option<String>,
    pub super_name: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct NewPower {
    pub name: String,
    pub description: String,
}

/// Partial update for a power. The description is checked against the merged
/// state inside the update transaction, not here.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PowerChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct NewHeroPower {
    pub strength: Strength,
    pub hero_id: i64,
    pub power_id: i64,
}
