use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of categories a vault item can carry. Free text from the
/// vision model or manual entry is folded into this set by `from_label`.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum ActivityType {
    Sightseeing,
    Culture,
    Adventure,
    Wellness,
    Entertainment,
    Shopping,
    Events,
    Transportation,
    Accommodations,
    #[serde(rename = "Food & Drink")]
    FoodAndDrink,
    Other,
}

pub const ALL_ACTIVITY_TYPES: [ActivityType; 11] = [
    ActivityType::Sightseeing,
    ActivityType::Culture,
    ActivityType::Adventure,
    ActivityType::Wellness,
    ActivityType::Entertainment,
    ActivityType::Shopping,
    ActivityType::Events,
    ActivityType::Transportation,
    ActivityType::Accommodations,
    ActivityType::FoodAndDrink,
    ActivityType::Other,
];

// Scanned top to bottom; first substring hit wins, so the order is part of
// the contract.
const LABEL_VARIATIONS: [(&str, ActivityType); 29] = [
    ("museum", ActivityType::Culture),
    ("gallery", ActivityType::Culture),
    ("historical", ActivityType::Culture),
    ("landmark", ActivityType::Sightseeing),
    ("viewpoint", ActivityType::Sightseeing),
    ("scenic", ActivityType::Sightseeing),
    ("restaurant", ActivityType::FoodAndDrink),
    ("cafe", ActivityType::FoodAndDrink),
    ("bar", ActivityType::FoodAndDrink),
    ("hotel", ActivityType::Accommodations),
    ("accommodation", ActivityType::Accommodations),
    ("transport", ActivityType::Transportation),
    ("flight", ActivityType::Transportation),
    ("train", ActivityType::Transportation),
    ("shopping", ActivityType::Shopping),
    ("retail", ActivityType::Shopping),
    ("market", ActivityType::Shopping),
    ("entertainment", ActivityType::Entertainment),
    ("show", ActivityType::Entertainment),
    ("concert", ActivityType::Entertainment),
    ("adventure", ActivityType::Adventure),
    ("outdoor", ActivityType::Adventure),
    ("sport", ActivityType::Adventure),
    ("wellness", ActivityType::Wellness),
    ("spa", ActivityType::Wellness),
    ("fitness", ActivityType::Wellness),
    ("event", ActivityType::Events),
    ("festival", ActivityType::Events),
    ("activity", ActivityType::Other),
];

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Sightseeing => "Sightseeing",
            ActivityType::Culture => "Culture",
            ActivityType::Adventure => "Adventure",
            ActivityType::Wellness => "Wellness",
            ActivityType::Entertainment => "Entertainment",
            ActivityType::Shopping => "Shopping",
            ActivityType::Events => "Events",
            ActivityType::Transportation => "Transportation",
            ActivityType::Accommodations => "Accommodations",
            ActivityType::FoodAndDrink => "Food & Drink",
            ActivityType::Other => "Other",
        }
    }

    /// Folds arbitrary free text onto the canonical set: exact canonical
    /// name first, then the keyword table, then `Other`. Pure and
    /// deterministic; used for both vision output and manual entry.
    pub fn from_label(label: &str) -> ActivityType {
        let normalized = label.trim();

        for activity_type in ALL_ACTIVITY_TYPES {
            if normalized == activity_type.as_str() {
                return activity_type;
            }
        }

        let lower = normalized.to_lowercase();
        for (keyword, activity_type) in LABEL_VARIATIONS {
            if lower.contains(keyword) {
                return activity_type;
            }
        }

        ActivityType::Other
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
