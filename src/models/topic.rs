use phf::phf_map;
use serde::{Deserialize, Serialize};

use crate::models::question::Language;

/// 物质运输方式（题目主题）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicTag {
    /// 扩散
    Diffusion,
    /// 渗透
    Osmosis,
    /// 主动运输
    Active,
}

impl TopicTag {
    /// 全部主题，按展示顺序
    pub const ALL: [TopicTag; 3] = [TopicTag::Diffusion, TopicTag::Osmosis, TopicTag::Active];

    /// 获取主题键名（与题库文件中的写法一致）
    pub fn key(self) -> &'static str {
        match self {
            TopicTag::Diffusion => "diffusion",
            TopicTag::Osmosis => "osmosis",
            TopicTag::Active => "active",
        }
    }

    /// 获取显示名称
    pub fn title(self, language: Language) -> &'static str {
        match (self, language) {
            (TopicTag::Diffusion, Language::Arabic) => "الانتشار",
            (TopicTag::Osmosis, Language::Arabic) => "الخاصية الاسموزية",
            (TopicTag::Active, Language::Arabic) => "النقل النشط",
            (TopicTag::Diffusion, Language::English) => "Diffusion",
            (TopicTag::Osmosis, Language::English) => "Osmosis",
            (TopicTag::Active, Language::English) => "Active transport",
        }
    }

    /// 从键名解析主题
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "diffusion" => Some(TopicTag::Diffusion),
            "osmosis" => Some(TopicTag::Osmosis),
            "active" => Some(TopicTag::Active),
            _ => None,
        }
    }
}

impl std::fmt::Display for TopicTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// 主题音的声音信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneProfile {
    /// 频率（Hz）
    pub frequency_hz: u32,
    /// 时长（毫秒）
    pub duration_ms: u64,
    /// 描述
    pub description: &'static str,
    /// 声音模式
    pub pattern: &'static str,
}

static TONE_PROFILES: phf::Map<&'static str, ToneProfile> = phf_map! {
    "diffusion" => ToneProfile {
        frequency_hz: 200,
        duration_ms: 2000,
        description: "نغمة ناعمة تمثل الانتشار التدريجي",
        pattern: "صوت متدرج وهادئ",
    },
    "osmosis" => ToneProfile {
        frequency_hz: 400,
        duration_ms: 2500,
        description: "نغمة متدفقة تمثل حركة الماء",
        pattern: "صوت متموج كالماء",
    },
    "active" => ToneProfile {
        frequency_hz: 800,
        duration_ms: 1500,
        description: "نغمة نشطة تمثل الطاقة الخلوية",
        pattern: "صوت إيقاعي نشط",
    },
};

/// 获取主题对应的声音信息
pub fn tone_profile(tag: TopicTag) -> &'static ToneProfile {
    // 三个主题在表中都有条目
    &TONE_PROFILES[tag.key()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_topic_has_profile() {
        for tag in TopicTag::ALL {
            assert!(TONE_PROFILES.contains_key(tag.key()));
            assert_eq!(TopicTag::from_key(tag.key()), Some(tag));
        }
    }

    #[test]
    fn test_profile_values() {
        assert_eq!(tone_profile(TopicTag::Diffusion).frequency_hz, 200);
        assert_eq!(tone_profile(TopicTag::Osmosis).duration_ms, 2500);
        assert_eq!(tone_profile(TopicTag::Active).frequency_hz, 800);
    }

    #[test]
    fn test_serde_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            topic: TopicTag,
        }
        let w: Wrapper = toml::from_str("topic = \"active\"").unwrap();
        assert_eq!(w.topic, TopicTag::Active);
    }
}
