use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;
use crate::models::Language;
use crate::services::CueTiming;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 题库 TOML 文件路径（为空时使用内置题库）
    pub question_bank_path: Option<String>,
    /// 显示语言
    pub language: Language,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 反馈提示配置 ---
    /// 点击提示后多久播放对错提示（毫秒）
    pub verdict_delay_ms: u64,
    /// 对错提示后多久播放主题音（毫秒）
    pub tone_delay_ms: u64,
    /// 是否按提示时长模拟播放
    pub simulate_cue_duration: bool,
    /// 结束时是否输出 JSON 成绩报告
    pub report_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            question_bank_path: None,
            language: Language::Arabic,
            verbose_logging: false,
            verdict_delay_ms: 300,
            tone_delay_ms: 800,
            simulate_cue_duration: true,
            report_json: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            question_bank_path: std::env::var("QUESTION_BANK_PATH").ok().filter(|v| !v.trim().is_empty()).or(default.question_bank_path),
            language: std::env::var("QUIZ_LANGUAGE").ok().and_then(|v| match parse_language(&v) {
                Ok(lang) => Some(lang),
                Err(e) => {
                    warn!("⚠️ {}，使用默认语言", e);
                    None
                }
            }).unwrap_or(default.language),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            verdict_delay_ms: std::env::var("VERDICT_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verdict_delay_ms),
            tone_delay_ms: std::env::var("TONE_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.tone_delay_ms),
            simulate_cue_duration: std::env::var("SIMULATE_CUE_DURATION").ok().and_then(|v| v.parse().ok()).unwrap_or(default.simulate_cue_duration),
            report_json: std::env::var("REPORT_JSON").ok().and_then(|v| v.parse().ok()).unwrap_or(default.report_json),
        }
    }

    /// 反馈序列的延迟设置
    pub fn cue_timing(&self) -> CueTiming {
        CueTiming {
            verdict_delay: Duration::from_millis(self.verdict_delay_ms),
            tone_delay: Duration::from_millis(self.tone_delay_ms),
        }
    }
}

/// 解析语言代码（ar / en）
pub fn parse_language(value: &str) -> Result<Language, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "ar" | "arabic" => Ok(Language::Arabic),
        "en" | "english" => Ok(Language::English),
        _ => Err(ConfigError::EnvVarParseFailed {
            var_name: "QUIZ_LANGUAGE".to_string(),
            value: value.to_string(),
            expected_type: "ar | en".to_string(),
        }),
    }
}
