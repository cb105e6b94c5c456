// Data models: types shared between the directory, the engine, and output.
//
// Kept free of rusqlite so the engine can use them without depending on the
// storage layer.

use serde::{Deserialize, Serialize};

/// Which population an entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    User,
    Channel,
}

impl EntityKind {
    /// Name of the directory table holding this kind.
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Channel => "channels",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Channel => "channel",
        }
    }

    /// Sigil used when mentioning an entity of this kind in chat.
    pub fn sigil(&self) -> char {
        match self {
            EntityKind::User => '@',
            EntityKind::Channel => '#',
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A row of the entity directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRow {
    pub id: String,
    pub name: String,
    pub score: Option<f64>,
    pub updated_at: String,
}

impl EntityRow {
    /// Name to show in chat and terminal output; falls back to the id.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Enforcement tiers, keyed off the crime coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnforcementTier {
    /// Below 100: not a target for enforcement action.
    Clear,
    /// 100 to 299: latent criminal, Non-Lethal Paralyzer.
    Paralyzer,
    /// 300 and above: Lethal Eliminator.
    Eliminator,
}

impl EnforcementTier {
    /// Determine the tier from a crime coefficient.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 300.0 => EnforcementTier::Eliminator,
            s if s >= 100.0 => EnforcementTier::Paralyzer,
            _ => EnforcementTier::Clear,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnforcementTier::Clear => "Clear",
            EnforcementTier::Paralyzer => "Paralyzer",
            EnforcementTier::Eliminator => "Eliminator",
        }
    }

    /// The Dominator's verdict for this tier, as spoken in chat.
    pub fn verdict(&self) -> &'static str {
        match self {
            EnforcementTier::Clear => {
                "Not a target for enforcement action. The trigger will be locked."
            }
            EnforcementTier::Paralyzer => {
                "Latent criminal. Enforcement mode: Non-Lethal Paralyzer. Please aim carefully and subdue the target."
            }
            EnforcementTier::Eliminator => {
                "Enforcement mode: Lethal Eliminator. Please proceed with maximum caution and eliminate the target."
            }
        }
    }
}

impl std::fmt::Display for EnforcementTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
