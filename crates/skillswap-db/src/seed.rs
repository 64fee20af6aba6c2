use anyhow::Result;
use tracing::info;

use crate::Database;

/// Starter catalogue offered by `db seed`.
pub const SKILL_CATALOGUE: &[&str] = &[
    "Baking",
    "Bicycle Repair",
    "Calligraphy",
    "Carpentry",
    "Chess",
    "Gardening",
    "Guitar",
    "Knitting",
    "Language Tutoring",
    "Photography",
    "Public Speaking",
    "Python",
    "Resume Review",
    "Rust",
    "Yoga",
];

impl Database {
    /// Inserts the catalogue skills that are not present yet. Returns how many were added.
    pub fn seed_skills(&self) -> Result<usize> {
        let added = self.with_conn(|conn| {
            let mut stmt = conn.prepare("INSERT OR IGNORE INTO skills (name) VALUES (?1)")?;
            let mut added = 0;
            for name in SKILL_CATALOGUE {
                added += stmt.execute([name])?;
            }
            Ok(added)
        })?;

        info!("Seeded {} of {} catalogue skills", added, SKILL_CATALOGUE.len());
        Ok(added)
    }
}
