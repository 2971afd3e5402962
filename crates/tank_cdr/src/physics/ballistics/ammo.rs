//! Ammunition types and modifiers

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Projectile construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmmoType {
    /// Armor piercing
    Ap,
    /// Armor piercing, capped
    Apc,
    /// Armor piercing with ballistic cap
    Apbc,
    /// Armor piercing, capped, with ballistic cap
    Apcbc,
    /// Armor piercing composite rigid (tungsten core)
    Apcr,
    /// Armor piercing incendiary
    Api,
    /// High explosive
    He,
    /// High explosive anti-tank (shaped charge)
    Heat,
    /// High explosive squash head
    Hesh,
    /// Smoke
    Smoke,
}

impl AmmoType {
    /// Rounds whose outcome is spalling rather than penetration
    pub fn is_spalling(self) -> bool {
        matches!(self, Self::He | Self::Hesh)
    }

    /// Rounds that carry a bursting charge on penetration
    pub fn is_explosive(self) -> bool {
        matches!(self, Self::He | Self::Heat | Self::Hesh)
    }

    /// Rounds with a penetrating cap
    pub fn is_capped(self) -> bool {
        matches!(self, Self::Apc | Self::Apcbc)
    }
}

bitflags! {
    /// Fuzing and tracer modifiers carried by a round
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct AmmoModifiers: u32 {
        /// Kinetic round with an HE burster
        const HE_BURSTER = 0x1;
        /// The burster has been armed
        const HE_BURSTER_ARMED = 0x2;
        /// Yellow tracer
        const YELLOW_TRACER = 0x1000;
        /// White tracer
        const WHITE_TRACER = 0x2000;
        /// Red tracer
        const RED_TRACER = 0x4000;
        /// Green tracer
        const GREEN_TRACER = 0x8000;
        /// Any tracer
        const TRACER = 0xF000;
    }
}

impl AmmoModifiers {
    /// Whether the round carries any tracer
    pub fn has_tracer(self) -> bool {
        self.intersects(Self::TRACER)
    }
}
