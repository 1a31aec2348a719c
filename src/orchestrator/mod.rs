//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层是整个程序的组合根，负责创建各组件并管理其生命周期。
//!
//! ### `quiz_runner` - 终端测验运行器
//! - 加载题库（内置或 TOML 文件）
//! - 创建播放器与反馈服务，初始化后注入测验会话
//! - 读取命令、渲染界面、在主页与测验页之间导航
//! - 退出时清理反馈服务
//!
//! ## 层次关系
//!
//! ```text
//! quiz_runner (界面循环 + 导航)
//!     ↓
//! workflow::QuizSession (作答、前进、后退、评分)
//!     ↓
//! services::FeedbackSequencer (提示序列，尽力而为)
//!     ↓
//! infrastructure::CuePlayer (平台音频/振动能力)
//! ```

pub mod quiz_runner;

pub use quiz_runner::{App, Navigator, RunSummary, Screen};
