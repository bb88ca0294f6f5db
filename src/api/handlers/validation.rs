//! Pure validation for incoming payloads.
//!
//! Every function here runs before any statement reaches the database and
//! returns the full list of problems it found, so a rejected request never
//! leaves a partial write behind.

use thiserror::Error;

use super::types::{
    CreateHeroPowerRequest, CreateHeroRequest, CreatePowerRequest, HeroChanges, NewHero,
    NewHeroPower, NewPower, PowerChanges, Strength, UpdateHeroRequest, UpdatePowerRequest,
};

pub const MIN_DESCRIPTION_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("request body is missing or malformed")]
    Payload,
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("description must be at least {MIN_DESCRIPTION_CHARS} characters long, got {0}")]
    DescriptionTooShort(usize),
    #[error("strength must be one of Strong, Weak, Average, got {0:?}")]
    InvalidStrength(String),
}

pub type Validated<T> = Result<T, Vec<ValidationError>>;

/// Checks the power description invariant.
///
/// # Errors
/// Returns `DescriptionTooShort` when `description` has fewer than 20 characters.
pub fn validate_description(description: &str) -> Result<(), ValidationError> {
    let length = description.chars().count();
    if length < MIN_DESCRIPTION_CHARS {
        return Err(ValidationError::DescriptionTooShort(length));
    }
    Ok(())
}

/// Parses a strength, accepting only the exact enumerated names.
///
/// # Errors
/// Returns `InvalidStrength` for anything else.
pub fn validate_strength(strength: &str) -> Result<Strength, ValidationError> {
    Strength::parse(strength).ok_or_else(|| ValidationError::InvalidStrength(strength.to_string()))
}

/// Trims `value` and rejects it if nothing is left.
fn non_empty(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(trimmed.to_string())
}

fn required(
    field: &'static str,
    value: Option<&str>,
    errors: &mut Vec<ValidationError>,
) -> Option<String> {
    match value {
        None => {
            errors.push(ValidationError::Missing(field));
            None
        }
        Some(value) => non_empty(field, value).map_err(|err| errors.push(err)).ok(),
    }
}

fn optional(
    field: &'static str,
    value: Option<&str>,
    errors: &mut Vec<ValidationError>,
) -> Option<String> {
    value.and_then(|value| non_empty(field, value).map_err(|err| errors.push(err)).ok())
}

fn finish<T>(value: Option<T>, errors: Vec<ValidationError>) -> Validated<T> {
    match value {
        Some(value) if errors.is_empty() => Ok(value),
        _ if errors.is_empty() => Err(vec![ValidationError::Payload]),
        _ => Err(errors),
    }
}

/// Validates a hero creation request.
///
/// # Errors
/// Returns every missing or empty field.
pub fn validate_new_hero(request: &CreateHeroRequest) -> Validated<NewHero> {
    let mut errors = Vec::new();
    let name = required("name", request.name.as_deref(), &mut errors);
    let super_name = required("super_name", request.super_name.as_deref(), &mut errors);

    let hero = name
        .zip(super_name)
        .map(|(name, super_name)| NewHero { name, super_name });
    finish(hero, errors)
}

/// Validates a partial hero update. Absent fields are left untouched; present
/// fields must not be empty.
///
/// # Errors
/// Returns every provided field that is empty.
pub fn validate_hero_changes(request: &UpdateHeroRequest) -> Validated<HeroChanges> {
    let mut errors = Vec::new();
    let changes = HeroChanges {
        name: optional("name", request.name.as_deref(), &mut errors),
        super_name: optional("super_name", request.super_name.as_deref(), &mut errors),
    };
    finish(Some(changes), errors)
}

/// Validates a power creation request, including the description length.
///
/// # Errors
/// Returns every missing or invalid field.
pub fn validate_new_power(request: &CreatePowerRequest) -> Validated<NewPower> {
    let mut errors = Vec::new();
    let name = required("name", request.name.as_deref(), &mut errors);
    let description = match request.description.as_deref() {
        None => {
            errors.push(ValidationError::Missing("description"));
            None
        }
        Some(description) => validate_description(description)
            .map(|()| description.to_string())
            .map_err(|err| errors.push(err))
            .ok(),
    };

    let power = name
        .zip(description)
        .map(|(name, description)| NewPower { name, description });
    finish(power, errors)
}

/// Validates the shape of a partial power update.
///
/// A provided description is checked here as well, but the stored description
/// still has to be re-checked against the merged state by the caller.
///
/// # Errors
/// Returns an empty name or a description that is too short.
pub fn validate_power_changes(request: &UpdatePowerRequest) -> Validated<PowerChanges> {
    let mut errors = Vec::new();
    let name = optional("name", request.name.as_deref(), &mut errors);
    let description = request.description.as_deref().and_then(|description| {
        validate_description(description)
            .map(|()| description.to_string())
            .map_err(|err| errors.push(err))
            .ok()
    });
    finish(Some(PowerChanges { name, description }), errors)
}

/// Validates a hero power creation request.
///
/// # Errors
/// Returns every missing field and an unknown strength.
pub fn validate_new_hero_power(request: &CreateHeroPowerRequest) -> Validated<NewHeroPower> {
    let mut errors = Vec::new();

    let strength = match request.strength.as_deref() {
        None => {
            errors.push(ValidationError::Missing("strength"));
            None
        }
        Some(strength) => validate_strength(strength)
            .map_err(|err| errors.push(err))
            .ok(),
    };
    if request.hero_id.is_none() {
        errors.push(ValidationError::Missing("hero_id"));
    }
    if request.power_id.is_none() {
        errors.push(ValidationError::Missing("power_id"));
    }

    let hero_power = match (strength, request.hero_id, request.power_id) {
        (Some(strength), Some(hero_id), Some(power_id)) => Some(NewHeroPower {
            strength,
            hero_id,
            power_id,
        }),
        _ => None,
    };
    finish(hero_power, errors)
}
