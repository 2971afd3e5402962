//! Armor slab descriptions read from model attributes

use crate::assets::AttributeSource;

use super::BallisticsError;

/// Armor metallurgy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmorType {
    /// Rolled homogeneous armor
    Rha,
    /// Face-hardened steel
    Fhs,
    /// Cast armor
    Cast,
}

impl ArmorType {
    /// Parse an `ARTYPE_` value; upper or lower case only
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "RHA" | "rha" => Some(Self::Rha),
            "FHS" | "fhs" => Some(Self::Fhs),
            "CAST" | "cast" => Some(Self::Cast),
            _ => None,
        }
    }
}

/// Plate arrangement of a slab, thicknesses in millimetres
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArmorLayout {
    /// One plate
    Single(f32),
    /// Two plates bolted face to face
    Layered {
        /// Plate struck first
        first: f32,
        /// Backing plate
        second: f32,
    },
    /// Two plates with an air gap
    Spaced {
        /// Plate struck first
        first: f32,
        /// Main plate
        second: f32,
    },
}

impl ArmorLayout {
    /// Parse an `ARTHCK_` value: `"t"`, `"a+b"` or `"a++b"`.
    ///
    /// In the pair forms the number written first is the second plate.
    pub fn parse(value: &str) -> Result<Self, String> {
        let number = |s: &str| s.trim().parse::<f32>().map_err(|_| value.to_string());
        if let Some((second, first)) = value.split_once("++") {
            Ok(Self::Spaced { first: number(first)?, second: number(second)? })
        } else if let Some((second, first)) = value.split_once('+') {
            Ok(Self::Layered { first: number(first)?, second: number(second)? })
        } else {
            Ok(Self::Single(number(value)?))
        }
    }

    /// Combined plate thickness
    pub fn total(&self) -> f32 {
        match *self {
            Self::Single(t) => t,
            Self::Layered { first, second } | Self::Spaced { first, second } => first + second,
        }
    }
}

/// A slab's layout and metallurgy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmorSlab {
    /// Plate arrangement
    pub layout: ArmorLayout,
    /// Metallurgy
    pub kind: ArmorType,
}

impl ArmorSlab {
    /// Read `ARTHCK_<slab>` and `ARTYPE_<slab>` for a model
    pub fn lookup<A: AttributeSource + ?Sized>(attributes: &A, model: &str, slab: &str) -> Result<Self, BallisticsError> {
        let thickness_key = format!("ARTHCK_{slab}");
        let raw = attributes
            .query(model, &thickness_key)
            .ok_or_else(|| BallisticsError::MissingAttribute { model: model.to_string(), key: thickness_key.clone() })?;
        let layout = ArmorLayout::parse(raw).map_err(|value| BallisticsError::MalformedNumber {
            model: model.to_string(),
            key: thickness_key,
            value,
        })?;

        let type_key = format!("ARTYPE_{slab}");
        let raw = attributes
            .query(model, &type_key)
            .ok_or_else(|| BallisticsError::MissingAttribute { model: model.to_string(), key: type_key })?;
        let kind = ArmorType::parse(raw).ok_or_else(|| BallisticsError::InvalidArmorType {
            model: model.to_string(),
            slab: slab.to_string(),
            value: raw.to_string(),
        })?;

        Ok(Self { layout, kind })
    }
}
