//! # Membrane Quiz
//!
//! 细胞膜物质运输（扩散、渗透、主动运输）测验，阿拉伯语内容附英语译文
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有平台音频/振动能力，只暴露"播放提示"
//! - `CuePlayer` - 播放器接口，`LogCuePlayer` 为日志实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `FeedbackSequencer` - 尽力而为的提示派发与作答反馈序列
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次测验"的完整流程
//! - `QuizState` - 进度状态机（作答中 → 结果）
//! - `QuizSession` - 作答、导航、评分、回顾
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/quiz_runner` - 终端界面循环，组件的创建与清理
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{CueError, CueKind, CuePlayer, FeedbackRequest, LogCuePlayer};
pub use models::{Language, Question, QuestionBank, TopicTag};
pub use orchestrator::App;
pub use services::{CueTiming, FeedbackSequencer};
pub use workflow::{Phase, QuizSession, QuizState};
