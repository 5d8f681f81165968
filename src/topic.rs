// src/topic.rs
//! Topic keys: the fixed set of regions a reader can switch between.
//!
//! A topic selects both the search context of the batch prompt and the
//! partition of the regional cache.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Topic {
    #[default]
    Oman,
    Gulf,
    Iran,
    IsraelPalestine,
    YemenHouthis,
    Syria,
    EuropeanUnion,
    UnitedStates,
    China,
}

impl Topic {
    /// Display order of the region tabs.
    pub const ALL: [Topic; 9] = [
        Topic::Oman,
        Topic::Gulf,
        Topic::Iran,
        Topic::IsraelPalestine,
        Topic::YemenHouthis,
        Topic::Syria,
        Topic::EuropeanUnion,
        Topic::UnitedStates,
        Topic::China,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Topic::Oman => "阿曼",
            Topic::Gulf => "海湾地区",
            Topic::Iran => "伊朗",
            Topic::IsraelPalestine => "巴以局势",
            Topic::YemenHouthis => "也门胡塞",
            Topic::Syria => "叙利亚",
            Topic::EuropeanUnion => "欧盟",
            Topic::UnitedStates => "美国",
            Topic::China => "中国",
        }
    }

    /// English search phrase handed to the grounded search tool.
    pub fn search_context(self) -> &'static str {
        match self {
            Topic::Oman => "Oman latest news",
            Topic::Gulf => {
                "Gulf Cooperation Council (GCC) countries (Saudi Arabia, UAE, Qatar, Kuwait, Bahrain) current news exclude Oman"
            }
            Topic::Iran => "Iran current news politics economy",
            Topic::IsraelPalestine => "Israel Palestine conflict Gaza strip war latest news",
            Topic::YemenHouthis => "Yemen Houthis conflict Red Sea crisis latest news",
            Topic::Syria => "Syria civil war politics latest news",
            Topic::EuropeanUnion => "European Union politics foreign affairs latest news",
            Topic::UnitedStates => "USA politics foreign policy economy latest news",
            Topic::China => "China politics economy foreign affairs latest news",
        }
    }

    /// Exact label lookup (surrounding whitespace ignored).
    pub fn parse(label: &str) -> Option<Topic> {
        let wanted = label.trim();
        Topic::ALL.into_iter().find(|t| t.label() == wanted)
    }

    /// Unknown labels fall back to the default region.
    pub fn from_label_or_default(label: &str) -> Topic {
        Topic::parse(label).unwrap_or_default()
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Topic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Topic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Topic::from_label_or_default(&raw))
    }
}
