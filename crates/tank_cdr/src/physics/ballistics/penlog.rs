//! Plain-text penetration log

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::{AmmoType, CollisionResponseResult, ResponseModifiers};

const HEADER: &str = "                   -= Korps Penetration Log =-";

/// One logged impact
#[derive(Debug, Clone)]
pub struct PenetrationRecord<'a> {
    /// Simulation time, seconds
    pub sim_time: f64,
    /// Struck model
    pub target_model: &'a str,
    /// Projectile model
    pub projectile_model: &'a str,
    /// Struck slab
    pub slab: &'a str,
    /// Combined armor thickness, mm
    pub armor_thickness: f32,
    /// Shell diameter, mm
    pub shell_diameter: f32,
    /// Travel distance, without the ricochet offset
    pub travel_distance: f32,
    /// Projectile construction
    pub ammo: AmmoType,
    /// Evaluation outcome
    pub result: &'a CollisionResponseResult,
}

impl PenetrationRecord<'_> {
    /// Render the record block, terminated by an empty line
    pub fn render(&self) -> String {
        let r = self.result;
        let mut out = String::new();
        out.push_str(&format!("Collision at {} seconds :\n", self.sim_time));
        out.push_str(&format!("  Object.................: {}\n", self.target_model));
        out.push_str(&format!("  Projectile.............: {}\n", self.projectile_model));
        out.push_str(&format!("  Impact Slab............: {}\n", self.slab));
        out.push_str(&format!("  Impact Angle...........: {}\n", r.impact_angle));
        out.push_str(&format!("  Armor Thickness (mm)...: {}\n", self.armor_thickness));
        out.push_str(&format!("  Shell Diameter (mm)....: {}\n", self.shell_diameter));
        out.push_str(&format!("  T/D Ratio..............: {:.4}\n", r.td_ratio));
        out.push_str(&format!("  Slope Effect Multiplier: {:.4}\n", r.slope_effect));
        out.push_str(&format!("  Other Multipliers......: {:.4}\n", r.multipliers));
        out.push_str(&format!("  Armor Resistance (mm)..: {:.4}\n", r.resistance));
        out.push_str(&format!("  Shell Flight Dist. (m).: {:.4}\n", self.travel_distance));
        if !matches!(self.ammo, AmmoType::He | AmmoType::Heat | AmmoType::Hesh) {
            out.push_str(&format!("  Striking Velocity (m/s): {:.4}\n", r.impact_velocity));
        }
        out.push_str(&format!("  Shell Penetration (mm).: {:.4}\n", r.penetration));
        out.push_str(&format!("  P/R Ratio..............: {:.4}\n", r.pr_ratio));
        out.push_str(&format!("  Penetration Probability: {:.4}\n", r.probability));

        let resultant = if r.modifiers.contains(ResponseModifiers::FULL_PEN) {
            "Yes (Full Penetration)"
        } else if r.modifiers.contains(ResponseModifiers::PARTIAL_PEN) {
            "Yes (Partial Penetration)"
        } else if r.modifiers.contains(ResponseModifiers::MAJOR_SPALLING) {
            "Yes (Major Spalling)"
        } else if r.modifiers.contains(ResponseModifiers::MINOR_SPALLING) {
            "Yes (Minor Spalling)"
        } else {
            "None"
        };
        out.push_str(&format!("  Penetration Resultant..: {resultant}\n\n"));
        out
    }
}

/// Append-only log file, truncated when created
#[derive(Debug)]
pub struct PenetrationLog {
    path: PathBuf,
}

impl PenetrationLog {
    /// Truncate `path` and write the header
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::create(&path)?;
        writeln!(file, "{HEADER}")?;
        writeln!(file)?;
        file.flush()?;
        Ok(Self { path })
    }

    /// File the log writes to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record; failures are reported and otherwise ignored
    pub fn append(&self, record: &PenetrationRecord<'_>) {
        if let Err(err) = self.try_append(record) {
            log::warn!("Failed to write penetration log '{}': {}", self.path.display(), err);
        }
    }

    fn try_append(&self, record: &PenetrationRecord<'_>) -> io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(record.render().as_bytes())?;
        file.flush()
    }
}
