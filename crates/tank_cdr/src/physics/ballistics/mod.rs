//! Armor penetration model
//!
//! Turns a detected hit into a [`CollisionResponseResult`]: armor and round
//! data come from the attribute database, the outcome is rolled with a
//! caller-supplied RNG.

mod ammo;
mod armor;
mod evaluate;
mod penlog;
mod probability;
mod slope;

pub use ammo::{AmmoModifiers, AmmoType};
pub use armor::{ArmorLayout, ArmorSlab, ArmorType};
pub use evaluate::{
    CollisionResponseResult, ImpactContext, PenetrationCurve, PenetrationModel, PlaceholderPolicy, ResponseModifiers,
};
pub use penlog::{PenetrationLog, PenetrationRecord};
pub use probability::{penetration_probability, roll};
pub use slope::slope_effect;

use thiserror::Error;

use crate::assets::AttributeSource;

/// Missing or invalid armor and ammunition data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BallisticsError {
    /// A required attribute is not defined for the model
    #[error("{key} not defined for model '{model}'")]
    MissingAttribute {
        /// Model queried
        model: String,
        /// Attribute key
        key: String,
    },

    /// `ARTYPE_` holds an unknown armor type
    #[error("invalid armor type '{value}' for slab {slab} of model '{model}'")]
    InvalidArmorType {
        /// Model queried
        model: String,
        /// Armor slab
        slab: String,
        /// Offending value
        value: String,
    },

    /// A numeric attribute does not parse
    #[error("{key} = '{value}' is not a number (model '{model}')")]
    MalformedNumber {
        /// Model queried
        model: String,
        /// Attribute key
        key: String,
        /// Offending value
        value: String,
    },

    /// Neither the FHS nor the RHA penetration curve is defined
    #[error("penetration curve not defined for round '{0}'")]
    MissingPenetrationCurve(String),
}

/// Numeric attribute; `Ok(None)` when absent
fn number_attribute<A: AttributeSource + ?Sized>(
    attributes: &A,
    model: &str,
    key: &str,
) -> Result<Option<f32>, BallisticsError> {
    let Some(raw) = attributes.query(model, key) else {
        return Ok(None);
    };
    raw.trim().parse::<f32>().map(Some).map_err(|_| BallisticsError::MalformedNumber {
        model: model.to_string(),
        key: key.to_string(),
        value: raw.to_string(),
    })
}

/// Numeric attribute that must be present
fn required_number<A: AttributeSource + ?Sized>(attributes: &A, model: &str, key: &str) -> Result<f32, BallisticsError> {
    number_attribute(attributes, model, key)?.ok_or_else(|| BallisticsError::MissingAttribute {
        model: model.to_string(),
        key: key.to_string(),
    })
}
