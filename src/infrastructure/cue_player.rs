//! 提示播放器 - 基础设施层
//!
//! 持有平台音频/振动能力，只暴露"播放一个提示"的能力

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::topic::{tone_profile, TopicTag};

/// 单个提示的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CueKind {
    /// 按钮点击
    Click,
    /// 回答正确
    Success,
    /// 回答错误
    Error,
    /// 主题音
    TopicTone(TopicTag),
}

impl CueKind {
    /// 提示的名义时长
    pub fn duration(self) -> Duration {
        match self {
            CueKind::Click => Duration::from_millis(200),
            CueKind::Success => Duration::from_millis(800),
            CueKind::Error => Duration::from_millis(600),
            CueKind::TopicTone(tag) => Duration::from_millis(tone_profile(tag).duration_ms),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CueKind::Click => "click",
            CueKind::Success => "success",
            CueKind::Error => "error",
            CueKind::TopicTone(tag) => tag.key(),
        }
    }
}

impl std::fmt::Display for CueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// 一次提示请求（不持久化）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackRequest {
    pub kind: CueKind,
}

impl FeedbackRequest {
    pub fn new(kind: CueKind) -> Self {
        Self { kind }
    }

    pub fn click() -> Self {
        Self::new(CueKind::Click)
    }

    /// 按对错选择提示
    pub fn verdict(correct: bool) -> Self {
        if correct {
            Self::new(CueKind::Success)
        } else {
            Self::new(CueKind::Error)
        }
    }

    pub fn topic_tone(tag: TopicTag) -> Self {
        Self::new(CueKind::TopicTone(tag))
    }
}

/// 提示播放失败
///
/// 设备无音频、不支持振动、资源未加载都归为这一类
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CueError {
    #[error("音频设备不可用")]
    Unavailable,
    #[error("提示资源未加载: {0}")]
    NotLoaded(CueKind),
    #[error("播放后端错误: {0}")]
    Backend(String),
}

/// 平台音频/振动能力
///
/// 实现者不需要处理并发播放的互斥，重叠播放是允许的。
pub trait CuePlayer: Send + Sync {
    /// 准备音频模式并加载主题音
    fn prepare(&self) -> BoxFuture<'_, Result<(), CueError>>;

    /// 播放一个提示，返回时表示播放结束
    fn play(&self, kind: CueKind) -> BoxFuture<'_, Result<(), CueError>>;

    /// 停止所有正在播放的声音
    fn stop(&self) -> BoxFuture<'_, Result<(), CueError>>;

    /// 释放已加载的资源
    fn release(&self) -> BoxFuture<'_, Result<(), CueError>>;
}

/// 日志播放器
///
/// 在没有音频设备的终端上，用日志描述每个声音模式。
/// 主题音需要先 `prepare()`，点击和对错提示随时可用。
pub struct LogCuePlayer {
    loaded: AtomicBool,
    simulate_duration: bool,
}

impl LogCuePlayer {
    /// 创建新的日志播放器
    ///
    /// `simulate_duration` 为 true 时，`play` 会等待提示的名义时长
    pub fn new(simulate_duration: bool) -> Self {
        Self {
            loaded: AtomicBool::new(false),
            simulate_duration,
        }
    }

    fn describe(kind: CueKind) {
        match kind {
            CueKind::Click => info!("🔊 点击音: 短促清脆的反馈"),
            CueKind::Success => info!("🔊 正确提示: 上行的积极音阶"),
            CueKind::Error => info!("🔊 错误提示: 柔和的下行音"),
            CueKind::TopicTone(tag) => {
                let profile = tone_profile(tag);
                info!(
                    "🎶 {} 主题音: {}Hz, {}ms, {}",
                    tag, profile.frequency_hz, profile.duration_ms, profile.pattern
                );
            }
        }
    }
}

impl Default for LogCuePlayer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CuePlayer for LogCuePlayer {
    fn prepare(&self) -> BoxFuture<'_, Result<(), CueError>> {
        async move {
            debug!("创建主题音: diffusion / osmosis / active");
            self.loaded.store(true, Ordering::SeqCst);
            Ok(())
        }
        .boxed()
    }

    fn play(&self, kind: CueKind) -> BoxFuture<'_, Result<(), CueError>> {
        async move {
            if matches!(kind, CueKind::TopicTone(_)) && !self.loaded.load(Ordering::SeqCst) {
                return Err(CueError::NotLoaded(kind));
            }

            Self::describe(kind);

            if self.simulate_duration {
                debug!("🎵 开始播放 {} ({}ms)", kind, kind.duration().as_millis());
                tokio::time::sleep(kind.duration()).await;
                debug!("🎵 播放结束 {}", kind);
            }
            Ok(())
        }
        .boxed()
    }

    fn stop(&self) -> BoxFuture<'_, Result<(), CueError>> {
        async move {
            debug!("🔇 停止所有声音");
            Ok(())
        }
        .boxed()
    }

    fn release(&self) -> BoxFuture<'_, Result<(), CueError>> {
        async move {
            self.loaded.store(false, Ordering::SeqCst);
            debug!("🧹 已释放主题音");
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_cue_durations() {
        assert_eq!(CueKind::Click.duration(), Duration::from_millis(200));
        assert_eq!(CueKind::Success.duration(), Duration::from_millis(800));
        assert_eq!(CueKind::Error.duration(), Duration::from_millis(600));
        assert_eq!(
            CueKind::TopicTone(TopicTag::Osmosis).duration(),
            Duration::from_millis(2500)
        );
    }

    #[test]
    fn test_verdict_request() {
        assert_eq!(FeedbackRequest::verdict(true).kind, CueKind::Success);
        assert_eq!(FeedbackRequest::verdict(false).kind, CueKind::Error);
    }

    #[tokio::test]
    async fn test_topic_tone_requires_prepare() {
        let player = LogCuePlayer::new(false);
        let tone = CueKind::TopicTone(TopicTag::Diffusion);

        assert_eq!(player.play(tone).await, Err(CueError::NotLoaded(tone)));
        assert_ok!(player.play(CueKind::Click).await);

        assert_ok!(player.prepare().await);
        assert_ok!(player.play(tone).await);

        assert_ok!(player.release().await);
        assert_err!(player.play(tone).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_duration() {
        let player = LogCuePlayer::new(true);
        let start = tokio::time::Instant::now();
        assert_ok!(player.play(CueKind::Success).await);
        assert!(start.elapsed() >= Duration::from_millis(800));
    }
}
