use crate::ingestion::PerformanceRow;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Entity classification buckets, declared in lookup priority order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[schemars(description = "Core markets")]
    Tier1,
    #[schemars(description = "Secondary markets")]
    Tier2,
    #[schemars(description = "Test markets")]
    Tier3,
    #[schemars(description = "Entities not listed in any tier")]
    Uncategorized,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Tier1, Tier::Tier2, Tier::Tier3, Tier::Uncategorized];

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Tier1 => "Tier 1",
            Tier::Tier2 => "Tier 2",
            Tier::Tier3 => "Tier 3",
            Tier::Uncategorized => "Uncategorized",
        }
    }

    /// Uncategorized -> Tier1 -> Tier2 -> Tier3 -> Uncategorized.
    pub fn next_in_cycle(&self) -> Tier {
        match self {
            Tier::Uncategorized => Tier::Tier1,
            Tier::Tier1 => Tier::Tier2,
            Tier::Tier2 => Tier::Tier3,
            Tier::Tier3 => Tier::Uncategorized,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct CategoryConfig {
    #[serde(default)]
    #[schemars(description = "Entity names in the first (highest priority) tier")]
    pub tier1: Vec<String>,
    #[serde(default)]
    pub tier2: Vec<String>,
    #[serde(default)]
    pub tier3: Vec<String>,
}

impl CategoryConfig {
    /// Country lists in both Chinese and English for the usual market tiers.
    pub fn bilingual_default() -> Self {
        let owned = |names: &[&str]| -> Vec<String> { names.iter().map(|s| s.to_string()).collect() };
        Self {
            tier1: owned(&[
                "美国", "英国", "德国", "澳大利亚", "加拿大", "法国",
                "United States", "UK", "Germany", "Australia", "Canada", "France",
            ]),
            tier2: owned(&[
                "意大利", "西班牙", "荷兰", "墨西哥", "巴西", "沙特", "阿联酋", "韩国", "日本",
                "Italy", "Spain", "Netherlands", "Mexico", "Brazil", "Saudi Arabia", "UAE",
                "Korea", "Japan",
            ]),
            tier3: owned(&[
                "印度", "波兰", "瑞典", "俄罗斯", "越南", "新加坡", "土耳其", "以色列",
                "India", "Poland", "Sweden", "Russia", "Vietnam", "Singapore", "Turkey", "Israel",
            ]),
        }
    }

    /// Builds a config from three comma-separated lists.
    pub fn from_text_lists(tier1: &str, tier2: &str, tier3: &str) -> Self {
        Self {
            tier1: parse_name_list(tier1),
            tier2: parse_name_list(tier2),
            tier3: parse_name_list(tier3),
        }
    }

    pub fn to_text_lists(&self) -> (String, String, String) {
        (
            self.tier1.join(", "),
            self.tier2.join(", "),
            self.tier3.join(", "),
        )
    }

    pub fn names(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::Tier1 => &self.tier1,
            Tier::Tier2 => &self.tier2,
            Tier::Tier3 => &self.tier3,
            Tier::Uncategorized => &[],
        }
    }

    fn names_mut(&mut self, tier: Tier) -> Option<&mut Vec<String>> {
        match tier {
            Tier::Tier1 => Some(&mut self.tier1),
            Tier::Tier2 => Some(&mut self.tier2),
            Tier::Tier3 => Some(&mut self.tier3),
            Tier::Uncategorized => None,
        }
    }

    pub fn categorize(&self, entity: &str) -> Tier {
        categorize(entity, self)
    }

    /// Returns a new config with `entity` moved one step along the tier cycle.
    /// A blank name leaves the config unchanged.
    pub fn cycle_entity(&self, entity: &str) -> CategoryConfig {
        let name = entity.trim();
        if name.is_empty() {
            return self.clone();
        }

        let current = self.categorize(name);
        let norm = name.to_lowercase();
        let mut next_config = self.clone();

        if let Some(list) = next_config.names_mut(current) {
            list.retain(|existing| existing.to_lowercase() != norm);
        }
        if let Some(list) = next_config.names_mut(current.next_in_cycle()) {
            if !list.iter().any(|existing| existing.to_lowercase() == norm) {
                list.push(name.to_string());
            }
        }

        next_config
    }

    pub fn rule_count(&self) -> usize {
        self.tier1.len() + self.tier2.len() + self.tier3.len()
    }
}

/// Case-insensitive exact lookup against tier1, then tier2, then tier3.
pub fn categorize(entity: &str, config: &CategoryConfig) -> Tier {
    let norm = entity.trim().to_lowercase();
    if norm.is_empty() {
        return Tier::Uncategorized;
    }

    [Tier::Tier1, Tier::Tier2, Tier::Tier3]
        .into_iter()
        .find(|tier| config.names(*tier).iter().any(|name| name.to_lowercase() == norm))
        .unwrap_or(Tier::Uncategorized)
}

pub fn parse_name_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Unique entity names seen in `rows`, sorted.
pub fn detected_entities(rows: &[PerformanceRow]) -> Vec<String> {
    rows.iter()
        .map(|row| row.entity.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CategoryConfig {
        CategoryConfig::from_text_lists("US, UK", "us, Japan", "India,,  ")
    }

    #[test]
    fn test_text_lists_trim_and_drop_empty() {
        let cfg = config();
        assert_eq!(cfg.tier1, vec!["US", "UK"]);
        assert_eq!(cfg.tier3, vec!["India"]);
        assert_eq!(cfg.to_text_lists().0, "US, UK");
    }

    #[test]
    fn test_priority_and_case_insensitivity() {
        let cfg = config();
        assert_eq!(categorize("us", &cfg), Tier::Tier1);
        assert_eq!(categorize(" japan ", &cfg), Tier::Tier2);
        assert_eq!(categorize("INDIA", &cfg), Tier::Tier3);
        assert_eq!(categorize("Brazil", &cfg), Tier::Uncategorized);
    }

    #[test]
    fn test_blank_names_are_uncategorized() {
        let cfg = CategoryConfig::from_text_lists("", "", "");
        assert_eq!(categorize("", &cfg), Tier::Uncategorized);
        assert_eq!(categorize("   ", &cfg), Tier::Uncategorized);
    }

    #[test]
    fn test_no_partial_matches() {
        let cfg = config();
        assert_eq!(categorize("USA", &cfg), Tier::Uncategorized);
    }

    #[test]
    fn test_cycle_entity_walks_all_tiers() {
        let start = CategoryConfig::default();
        let step1 = start.cycle_entity("Chile");
        assert_eq!(step1.categorize("chile"), Tier::Tier1);
        let step2 = step1.cycle_entity("chile");
        assert_eq!(step2.categorize("Chile"), Tier::Tier2);
        assert!(step2.tier1.is_empty());
        let step3 = step2.cycle_entity("Chile");
        assert_eq!(step3.categorize("Chile"), Tier::Tier3);
        let step4 = step3.cycle_entity("Chile");
        assert_eq!(step4.categorize("Chile"), Tier::Uncategorized);
        assert_eq!(step4.rule_count(), 0);
        assert!(start.tier1.is_empty());
    }

    #[test]
    fn test_cycle_entity_ignores_blank_names() {
        let start = CategoryConfig::from_text_lists("US", "", "");
        let next = start.cycle_entity("   ");
        assert_eq!(next, start);
        assert_eq!(next.to_text_lists().0, "US");
    }

    #[test]
    fn test_cycle_entity_does_not_duplicate_next_tier_entry() {
        // "us" sits in tier1 and, shadowed, in tier2 as well.
        let start = config();
        let next = start.cycle_entity("US");
        assert_eq!(next.tier1, vec!["UK"]);
        assert_eq!(next.tier2, vec!["us", "Japan"]);
        assert_eq!(next.categorize("US"), Tier::Tier2);
    }

    #[test]
    fn test_bilingual_default_covers_both_spellings() {
        let cfg = CategoryConfig::bilingual_default();
        assert_eq!(cfg.categorize("美国"), Tier::Tier1);
        assert_eq!(cfg.categorize("united states"), Tier::Tier1);
        assert_eq!(cfg.categorize("日本"), Tier::Tier2);
        assert_eq!(cfg.categorize("Singapore"), Tier::Tier3);
    }

    #[test]
    fn test_tier_serialization() {
        assert_eq!(serde_json::to_string(&Tier::Uncategorized).unwrap(), "\"uncategorized\"");
        assert_eq!(serde_json::to_string(&Tier::Tier2).unwrap(), "\"tier2\"");
    }

    #[test]
    fn test_detected_entities_sorted_unique() {
        let row = |name: &str| PerformanceRow {
            entity: name.to_string(),
            cost: 0.0,
            impressions: 0.0,
            clicks: 0.0,
            leads: 0.0,
            qualified_click_ratio: 0.0,
            source_click_cost: 0.0,
            period: None,
        };
        let rows = vec![row("US"), row("DE"), row("US")];
        assert_eq!(detected_entities(&rows), vec!["DE", "US"]);
    }
}
