use serde::{Deserialize, Serialize};

/// The three parallel operating profiles every task is modeled under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RealityMode {
    Optimistic,
    Realistic,
    Disaster,
}

impl Default for RealityMode {
    fn default() -> Self {
        Self::Realistic
    }
}

impl RealityMode {
    pub const ALL: [RealityMode; 3] = [Self::Optimistic, Self::Realistic, Self::Disaster];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Optimistic => "optimistic",
            Self::Realistic => "realistic",
            Self::Disaster => "disaster",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "optimistic" => Some(Self::Optimistic),
            "realistic" => Some(Self::Realistic),
            "disaster" => Some(Self::Disaster),
            _ => None,
        }
    }

    /// The two modes that are not `self`.
    pub fn others(&self) -> [RealityMode; 2] {
        match self {
            Self::Optimistic => [Self::Realistic, Self::Disaster],
            Self::Realistic => [Self::Optimistic, Self::Disaster],
            Self::Disaster => [Self::Optimistic, Self::Realistic],
        }
    }

    pub fn config(&self) -> &'static RealityConfig {
        match self {
            Self::Optimistic => &OPTIMISTIC,
            Self::Realistic => &REALISTIC,
            Self::Disaster => &DISASTER,
        }
    }
}

/// Stochastic effect profile applied while a mode is active.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectProfile {
    /// Per-task chance of autonomous completion on a general effects tick.
    pub auto_complete_chance: f64,
    /// Whether the general effects process may duplicate tasks.
    pub task_duplication: bool,
    /// Scales the time remaining until a deadline at read time.
    pub deadline_multiplier: f64,
    /// Scales difficulty at read time, clamped to the 1..=10 range.
    pub difficulty_reduction: f64,
    /// Scales point values at read time.
    pub point_multiplier: f64,
}

/// Fixed per-mode configuration. Not editable at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RealityConfig {
    pub name: &'static str,
    pub tagline: &'static str,
    pub effects: EffectProfile,
}

static OPTIMISTIC: RealityConfig = RealityConfig {
    name: "Optimistic Reality",
    tagline: "Everything goes perfectly!",
    effects: EffectProfile {
        auto_complete_chance: 0.3,
        task_duplication: false,
        deadline_multiplier: 1.5,
        difficulty_reduction: 0.7,
        point_multiplier: 2.0,
    },
};

static REALISTIC: RealityConfig = RealityConfig {
    name: "Realistic Reality",
    tagline: "Life as it usually is.",
    effects: EffectProfile {
        auto_complete_chance: 0.05,
        task_duplication: false,
        deadline_multiplier: 1.0,
        difficulty_reduction: 1.0,
        point_multiplier: 1.0,
    },
};

static DISASTER: RealityConfig = RealityConfig {
    name: "Disaster Reality",
    tagline: "Everything that can go wrong, will!",
    effects: EffectProfile {
        auto_complete_chance: 0.0,
        task_duplication: true,
        deadline_multiplier: 0.5,
        difficulty_reduction: 1.5,
        point_multiplier: 0.5,
    },
};
