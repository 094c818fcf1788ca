use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Top-level classification driving which policy branch applies
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PotionCategory {
    Health,
    Mana,
    Utility,
    #[default]
    Empty,
}

impl PotionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Mana => "mana",
            Self::Utility => "utility",
            Self::Empty => "empty",
        }
    }
}

/// Specific item identity resolved from a template match
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PotionSubtype {
    SmallHealthInstant,
    LargeHealthInstant,
    HealthOvertime,
    Regeneration,
    SmallManaInstant,
    LargeManaInstant,
    ManaOvertime,
    Clarity,
    Quicksilver,
    Strength,
    Defense,
    Invisibility,
    FireResistance,
    Jade,
    Granite,
    Silver,
    #[default]
    Empty,
}

impl PotionSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SmallHealthInstant => "small_health_instant",
            Self::LargeHealthInstant => "large_health_instant",
            Self::HealthOvertime => "health_overtime",
            Self::Regeneration => "regeneration",
            Self::SmallManaInstant => "small_mana_instant",
            Self::LargeManaInstant => "large_mana_instant",
            Self::ManaOvertime => "mana_overtime",
            Self::Clarity => "clarity",
            Self::Quicksilver => "quicksilver",
            Self::Strength => "strength",
            Self::Defense => "defense",
            Self::Invisibility => "invisibility",
            Self::FireResistance => "fire_resistance",
            Self::Jade => "jade",
            Self::Granite => "granite",
            Self::Silver => "silver",
            Self::Empty => "empty",
        }
    }

    /// Static item configuration, `None` for an empty slot
    pub fn config(&self) -> Option<&'static ItemConfig> {
        ITEM_TABLE.iter().find(|item| item.subtype == *self)
    }

    /// Map a template's (item-name, item-kind) pair to a canonical subtype.
    ///
    /// `name` is the display name (separator already replaced by spaces). The first matching
    /// rule wins. An unmatched occupied template falls back to the small instant variant of
    /// its kind; anything else resolves to `Empty`.
    pub fn resolve(name: &str, kind: &str, occupied: bool) -> Self {
        let name = name.to_lowercase();
        let kind = kind.to_lowercase();

        if name.contains("quicksilver") {
            return Self::Quicksilver;
        }
        if name.contains("silver") && kind == "utility" {
            return Self::Silver;
        }
        if name.contains("health") || kind == "health" {
            return if name.contains("small") {
                Self::SmallHealthInstant
            } else if name.contains("large") {
                Self::LargeHealthInstant
            } else if name.contains("regeneration") {
                Self::Regeneration
            } else if name.contains("overtime") {
                Self::HealthOvertime
            } else {
                Self::SmallHealthInstant
            };
        }
        if name.contains("mana") || kind == "mana" {
            return if name.contains("small") {
                Self::SmallManaInstant
            } else if name.contains("large") {
                Self::LargeManaInstant
            } else if name.contains("clarity") {
                Self::Clarity
            } else if name.contains("overtime") {
                Self::ManaOvertime
            } else {
                Self::SmallManaInstant
            };
        }
        if name.contains("defense") {
            return Self::Defense;
        }
        if name.contains("invisibility") {
            return Self::Invisibility;
        }
        if name.contains("fire") && name.contains("resistance") {
            return Self::FireResistance;
        }
        if name.contains("jade") {
            return Self::Jade;
        }
        if name.contains("granite") {
            return Self::Granite;
        }
        if name.contains("strength") {
            return Self::Strength;
        }

        if occupied {
            match kind.as_str() {
                "health" => Self::SmallHealthInstant,
                "mana" => Self::SmallManaInstant,
                _ => Self::Empty,
            }
        } else {
            Self::Empty
        }
    }
}

impl fmt::Display for PotionSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static per-subtype configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemConfig {
    pub subtype: PotionSubtype,
    pub category: PotionCategory,
    /// Kept as data only; the policy engine schedules with its own delays
    pub cooldown: Duration,
    pub max_uses: u32,
    /// Zero for instant items
    pub duration: Duration,
    pub instant: bool,
}

const fn item(
    subtype: PotionSubtype,
    category: PotionCategory,
    cooldown_ms: u64,
    max_uses: u32,
    duration_secs: u64,
    instant: bool,
) -> ItemConfig {
    ItemConfig {
        subtype,
        category,
        cooldown: Duration::from_millis(cooldown_ms),
        max_uses,
        duration: Duration::from_secs(duration_secs),
        instant,
    }
}

pub static ITEM_TABLE: [ItemConfig; 16] = [
    // Health
    item(PotionSubtype::SmallHealthInstant, PotionCategory::Health, 1000, 3, 0, true),
    item(PotionSubtype::LargeHealthInstant, PotionCategory::Health, 2000, 2, 0, true),
    item(PotionSubtype::HealthOvertime, PotionCategory::Health, 5000, 2, 15, false),
    item(PotionSubtype::Regeneration, PotionCategory::Health, 8000, 1, 30, false),
    // Mana
    item(PotionSubtype::SmallManaInstant, PotionCategory::Mana, 1000, 3, 0, true),
    item(PotionSubtype::LargeManaInstant, PotionCategory::Mana, 2000, 2, 0, true),
    item(PotionSubtype::ManaOvertime, PotionCategory::Mana, 5000, 2, 20, false),
    item(PotionSubtype::Clarity, PotionCategory::Mana, 10000, 1, 45, false),
    // Utility
    item(PotionSubtype::Quicksilver, PotionCategory::Utility, 2000, 3, 20, false),
    item(PotionSubtype::Strength, PotionCategory::Utility, 3000, 2, 30, false),
    item(PotionSubtype::Defense, PotionCategory::Utility, 3000, 2, 30, false),
    item(PotionSubtype::Invisibility, PotionCategory::Utility, 5000, 1, 15, false),
    item(PotionSubtype::FireResistance, PotionCategory::Utility, 4000, 2, 60, false),
    item(PotionSubtype::Jade, PotionCategory::Utility, 3000, 3, 30, false),
    item(PotionSubtype::Granite, PotionCategory::Utility, 3000, 3, 30, false),
    item(PotionSubtype::Silver, PotionCategory::Utility, 2000, 3, 20, false),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_subtype_but_empty_has_config() {
        assert!(PotionSubtype::Empty.config().is_none());

        for item in ITEM_TABLE.iter() {
            assert_eq!(item.subtype.config(), Some(item));
            assert!(item.max_uses > 0);
            assert_eq!(item.instant, item.duration.is_zero());
        }
    }

    #[test]
    fn test_item_table_values() {
        let clarity = PotionSubtype::Clarity.config().unwrap();
        assert_eq!(clarity.category, PotionCategory::Mana);
        assert_eq!(clarity.max_uses, 1);
        assert_eq!(clarity.duration, Duration::from_secs(45));

        let small = PotionSubtype::SmallHealthInstant.config().unwrap();
        assert!(small.instant);
        assert_eq!(small.max_uses, 3);
    }

    #[test]
    fn test_resolve_precedence() {
        // quicksilver beats the generic silver rule
        assert_eq!(
            PotionSubtype::resolve("quicksilver flask", "utility", true),
            PotionSubtype::Quicksilver
        );
        assert_eq!(
            PotionSubtype::resolve("silver flask", "utility", true),
            PotionSubtype::Silver
        );
        // silver only counts as its own type for utility templates
        assert_eq!(
            PotionSubtype::resolve("silver flask", "health", true),
            PotionSubtype::SmallHealthInstant
        );
        assert_eq!(
            PotionSubtype::resolve("large health flask", "health", true),
            PotionSubtype::LargeHealthInstant
        );
        assert_eq!(
            PotionSubtype::resolve("divine", "mana", true),
            PotionSubtype::SmallManaInstant
        );
        assert_eq!(
            PotionSubtype::resolve("clarity", "mana", true),
            PotionSubtype::Clarity
        );
        assert_eq!(
            PotionSubtype::resolve("Fire Resistance Flask", "utility", true),
            PotionSubtype::FireResistance
        );
        assert_eq!(
            PotionSubtype::resolve("granite", "utility", false),
            PotionSubtype::Granite
        );
    }

    #[test]
    fn test_resolve_unknown_names() {
        assert_eq!(
            PotionSubtype::resolve("mystery", "utility", true),
            PotionSubtype::Empty
        );
        assert_eq!(
            PotionSubtype::resolve("mystery", "other", false),
            PotionSubtype::Empty
        );
    }

    #[test]
    fn test_subtype_serialization() {
        assert_eq!(
            serde_json::to_string(&PotionSubtype::FireResistance).unwrap(),
            "\"fire_resistance\""
        );
        assert_eq!(
            serde_json::to_string(&PotionCategory::Utility).unwrap(),
            "\"utility\""
        );
    }
}
