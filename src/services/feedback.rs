//! 反馈提示服务 - 业务能力层
//!
//! 只负责"尽力播放提示"能力，不关心测验流程
//!
//! 所有提示都是装饰性的：失败只记日志，不影响调用方的状态变更。
//! 不排队、不防抖，连续触发时提示可以重叠。

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::join_all;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

use crate::infrastructure::{CueError, CueKind, CuePlayer, FeedbackRequest};
use crate::models::topic::{tone_profile, ToneProfile, TopicTag};

/// 作答反馈序列中各提示之间的延迟
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueTiming {
    /// 点击提示之后，到对错提示的延迟
    pub verdict_delay: Duration,
    /// 对错提示之后，到主题音的延迟
    pub tone_delay: Duration,
}

impl Default for CueTiming {
    fn default() -> Self {
        Self {
            verdict_delay: Duration::from_millis(300),
            tone_delay: Duration::from_millis(800),
        }
    }
}

/// 反馈提示服务
///
/// 职责：
/// - 管理播放器的初始化与清理（幂等）
/// - 以 fire-and-forget 方式派发提示
/// - 编排"点击 → 对错 → 主题音"的作答反馈序列
/// - 不认识 Question / QuizState
///
/// 克隆代价很低，所有克隆共享同一份状态。由组合根创建并注入，不是全局单例。
#[derive(Clone)]
pub struct FeedbackSequencer {
    inner: Arc<Inner>,
}

struct Inner {
    player: Arc<dyn CuePlayer>,
    timing: CueTiming,
    initialized: AtomicBool,
    active: Mutex<HashMap<u64, AbortHandle>>,
    next_id: AtomicU64,
    /// 每次 stop_all 递增，旧代的序列不再登记新提示
    generation: AtomicU64,
}

impl Inner {
    fn active(&self) -> MutexGuard<'_, HashMap<u64, AbortHandle>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FeedbackSequencer {
    /// 创建新的反馈提示服务
    pub fn new(player: Arc<dyn CuePlayer>, timing: CueTiming) -> Self {
        Self {
            inner: Arc::new(Inner {
                player,
                timing,
                initialized: AtomicBool::new(false),
                active: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn timing(&self) -> CueTiming {
        self.inner.timing
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::SeqCst)
    }

    /// 正在进行中的提示任务数量
    pub fn active_cues(&self) -> usize {
        self.inner.active().len()
    }

    /// 主题音的声音信息（用于界面展示）
    pub fn sound_info(&self, tag: TopicTag) -> &'static ToneProfile {
        tone_profile(tag)
    }

    /// 初始化播放器
    ///
    /// 已初始化时直接返回；准备失败只记日志，标记保持未初始化
    pub async fn initialize(&self) {
        if self.is_initialized() {
            debug!("反馈提示已初始化，跳过");
            return;
        }

        match self.inner.player.prepare().await {
            Ok(()) => {
                self.inner.initialized.store(true, Ordering::SeqCst);
                info!("✓ 反馈提示初始化成功");
            }
            Err(e) => {
                warn!("⚠️ 反馈提示初始化失败: {}", e);
            }
        }
    }

    pub async fn play_click(&self) -> Result<(), CueError> {
        self.play(CueKind::Click).await
    }

    pub async fn play_success(&self) -> Result<(), CueError> {
        self.play(CueKind::Success).await
    }

    pub async fn play_error(&self) -> Result<(), CueError> {
        self.play(CueKind::Error).await
    }

    /// 播放主题音
    ///
    /// 未初始化时先初始化，播放前先停止正在发声的提示
    pub async fn play_topic_tone(&self, tag: TopicTag) -> Result<(), CueError> {
        if !self.is_initialized() {
            self.initialize().await;
        }

        if let Err(e) = self.inner.player.stop().await {
            warn!("⚠️ 停止当前声音失败: {}", e);
        }

        self.play(CueKind::TopicTone(tag)).await
    }

    /// 按请求播放一个提示并等待结束
    pub async fn play_request(&self, request: FeedbackRequest) -> Result<(), CueError> {
        match request.kind {
            CueKind::Click => self.play_click().await,
            CueKind::Success => self.play_success().await,
            CueKind::Error => self.play_error().await,
            CueKind::TopicTone(tag) => self.play_topic_tone(tag).await,
        }
    }

    /// 派发一个提示，不等待结果
    ///
    /// 失败只记日志。没有 tokio 运行时时提示被丢弃。
    pub fn dispatch(&self, request: FeedbackRequest) -> CueTicket {
        self.dispatch_in(self.generation(), request)
    }

    fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    fn dispatch_in(&self, generation: u64, request: FeedbackRequest) -> CueTicket {
        let this = self.clone();
        self.track(generation, async move {
            // 失败已在 play() 中记录
            let _ = this.play_request(request).await;
        })
    }

    /// 作答反馈序列：点击 → 延迟 → 对错 → 延迟 → 主题音（仅答对时）
    ///
    /// 点击提示立即派发。返回的句柄可以忽略。
    pub fn answer_feedback(&self, correct: bool, topic: TopicTag) -> SequenceHandle {
        let generation = self.generation();
        let click = self.dispatch_in(generation, FeedbackRequest::click());

        let this = self.clone();
        let timing = self.inner.timing;
        let ticket = self.track(generation, async move {
            let mut cues = vec![click];

            tokio::time::sleep(timing.verdict_delay).await;
            cues.push(this.dispatch_in(generation, FeedbackRequest::verdict(correct)));

            if correct {
                tokio::time::sleep(timing.tone_delay).await;
                cues.push(this.dispatch_in(generation, FeedbackRequest::topic_tone(topic)));
            }

            join_all(cues.into_iter().map(CueTicket::wait)).await;
        });

        SequenceHandle { ticket }
    }

    /// 停止所有提示（尽力而为）
    ///
    /// 取消进行中的提示任务和尚未到点的序列，并停止播放器
    pub async fn stop_all(&self) {
        // 递增代数与清空列表在同一把锁内完成，其他线程上的序列无法在两者之间登记
        let handles: Vec<AbortHandle> = {
            let mut active = self.inner.active();
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            active.drain().map(|(_, h)| h).collect()
        };
        for handle in &handles {
            handle.abort();
        }

        match self.inner.player.stop().await {
            Ok(()) => info!("🔇 已停止所有提示 (取消 {} 个任务)", handles.len()),
            Err(e) => warn!("⚠️ 停止提示失败: {}", e),
        }
    }

    /// 清理：停止所有提示、释放资源、清除初始化标记
    ///
    /// 可重复调用
    pub async fn cleanup(&self) {
        self.stop_all().await;

        if let Err(e) = self.inner.player.release().await {
            warn!("⚠️ 释放提示资源失败: {}", e);
        }

        self.inner.initialized.store(false, Ordering::SeqCst);
        info!("🧹 反馈提示已清理");
    }

    async fn play(&self, kind: CueKind) -> Result<(), CueError> {
        let result = self.inner.player.play(kind).await;
        if let Err(e) = &result {
            warn!("⚠️ 播放提示 {} 失败: {}", kind, e);
        }
        result
    }

    /// 在运行时上启动任务并登记到进行中列表，结束时自动注销
    ///
    /// `generation` 已过期（期间调用过 stop_all）时不启动任务
    fn track<F>(&self, generation: u64, task: F) -> CueTicket
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("⚠️ 没有可用的异步运行时，丢弃提示: {}", e);
                return CueTicket { id, handle: None };
            }
        };

        let inner = Arc::clone(&self.inner);
        // 持锁登记，保证任务的注销发生在登记之后
        let mut active = self.inner.active();
        if self.generation() != generation {
            debug!("提示 {} 已被 stop_all 取消，不再启动", id);
            return CueTicket { id, handle: None };
        }
        let handle = runtime.spawn(async move {
            task.await;
            inner.active().remove(&id);
        });
        active.insert(id, handle.abort_handle());
        drop(active);

        CueTicket {
            id,
            handle: Some(handle),
        }
    }
}

/// 已派发提示的凭据
///
/// 丢弃凭据不会取消提示
#[derive(Debug)]
pub struct CueTicket {
    id: u64,
    handle: Option<JoinHandle<()>>,
}

impl CueTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 等待提示结束（被取消也视为结束）
    pub async fn wait(self) {
        if let Some(handle) = self.handle {
            if let Err(e) = handle.await {
                debug!("提示任务 {} 未正常结束: {}", self.id, e);
            }
        }
    }
}

/// 一次作答反馈序列的句柄
#[derive(Debug)]
pub struct SequenceHandle {
    ticket: CueTicket,
}

impl SequenceHandle {
    /// 等待序列中所有提示结束或被取消
    pub async fn wait(self) {
        self.ticket.wait().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::Instant;
    use tokio_test::{assert_err, assert_ok};

    /// 记录所有播放请求的播放器
    #[derive(Default)]
    struct RecordingPlayer {
        played: Mutex<Vec<(CueKind, Instant)>>,
        prepares: AtomicUsize,
        stops: AtomicUsize,
        fail: AtomicBool,
    }

    impl RecordingPlayer {
        fn failing() -> Self {
            let player = Self::default();
            player.fail.store(true, Ordering::SeqCst);
            player
        }

        fn kinds(&self) -> Vec<CueKind> {
            self.played.lock().unwrap().iter().map(|(k, _)| *k).collect()
        }

        fn check(&self) -> Result<(), CueError> {
            if self.fail.load(Ordering::SeqCst) {
                Err(CueError::Unavailable)
            } else {
                Ok(())
            }
        }
    }

    impl CuePlayer for RecordingPlayer {
        fn prepare(&self) -> BoxFuture<'_, Result<(), CueError>> {
            async move {
                self.prepares.fetch_add(1, Ordering::SeqCst);
                self.check()
            }
            .boxed()
        }

        fn play(&self, kind: CueKind) -> BoxFuture<'_, Result<(), CueError>> {
            async move {
                self.played.lock().unwrap().push((kind, Instant::now()));
                self.check()
            }
            .boxed()
        }

        fn stop(&self) -> BoxFuture<'_, Result<(), CueError>> {
            async move {
                self.stops.fetch_add(1, Ordering::SeqCst);
                self.check()
            }
            .boxed()
        }

        fn release(&self) -> BoxFuture<'_, Result<(), CueError>> {
            async move { self.check() }.boxed()
        }
    }

    fn sequencer(player: &Arc<RecordingPlayer>) -> FeedbackSequencer {
        FeedbackSequencer::new(player.clone(), CueTiming::default())
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let player = Arc::new(RecordingPlayer::default());
        let feedback = sequencer(&player);

        feedback.initialize().await;
        feedback.initialize().await;

        assert!(feedback.is_initialized());
        assert_eq!(player.prepares.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_initialize_failure_is_swallowed() {
        let player = Arc::new(RecordingPlayer::failing());
        let feedback = sequencer(&player);

        feedback.initialize().await;
        assert!(!feedback.is_initialized());
    }

    #[tokio::test(start_paused = true)]
    async fn test_correct_answer_sequence() {
        let player = Arc::new(RecordingPlayer::default());
        let feedback = sequencer(&player);

        feedback.answer_feedback(true, TopicTag::Osmosis).wait().await;

        assert_eq!(
            player.kinds(),
            vec![
                CueKind::Click,
                CueKind::Success,
                CueKind::TopicTone(TopicTag::Osmosis)
            ]
        );

        let played = player.played.lock().unwrap();
        let timing = CueTiming::default();
        assert!(played[1].1 - played[0].1 >= timing.verdict_delay);
        assert!(played[2].1 - played[1].1 >= timing.tone_delay);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_answer_has_no_topic_tone() {
        let player = Arc::new(RecordingPlayer::default());
        let feedback = sequencer(&player);

        feedback.answer_feedback(false, TopicTag::Active).wait().await;

        assert_eq!(player.kinds(), vec![CueKind::Click, CueKind::Error]);
        assert_eq!(feedback.active_cues(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_sequences_are_not_queued() {
        let player = Arc::new(RecordingPlayer::default());
        let feedback = sequencer(&player);

        let first = feedback.answer_feedback(false, TopicTag::Diffusion);
        let second = feedback.answer_feedback(true, TopicTag::Diffusion);
        first.wait().await;
        second.wait().await;

        let kinds = player.kinds();
        assert_eq!(kinds.iter().filter(|k| **k == CueKind::Click).count(), 2);
        assert_eq!(kinds[..2], [CueKind::Click, CueKind::Click]);
        assert!(kinds.contains(&CueKind::Error));
        assert!(kinds.contains(&CueKind::Success));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_player_never_raises() {
        let player = Arc::new(RecordingPlayer::failing());
        let feedback = sequencer(&player);

        feedback.answer_feedback(true, TopicTag::Active).wait().await;
        feedback.dispatch(FeedbackRequest::click()).wait().await;

        assert_err!(feedback.play_click().await);
        feedback.stop_all().await;
        feedback.cleanup().await;
        assert_eq!(feedback.active_cues(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_all_cancels_pending_cues() {
        let player = Arc::new(RecordingPlayer::default());
        let feedback = sequencer(&player);

        let handle = feedback.answer_feedback(true, TopicTag::Diffusion);
        tokio::task::yield_now().await;

        feedback.stop_all().await;
        handle.wait().await;

        assert!(!player.kinds().contains(&CueKind::Success));
        assert_eq!(feedback.active_cues(), 0);
        assert!(player.stops.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_stale_sequence_cannot_register_after_stop_all() {
        let player = Arc::new(RecordingPlayer::default());
        let feedback = sequencer(&player);

        let generation = feedback.generation();
        feedback.stop_all().await;

        let ticket = feedback.dispatch_in(generation, FeedbackRequest::verdict(true));
        assert_eq!(feedback.active_cues(), 0);
        ticket.wait().await;
        assert!(player.kinds().is_empty());

        // stop_all 之后的新派发不受影响
        feedback.dispatch(FeedbackRequest::click()).wait().await;
        assert_eq!(player.kinds(), vec![CueKind::Click]);
    }

    #[tokio::test]
    async fn test_cleanup_then_click() {
        let player = Arc::new(RecordingPlayer::default());
        let feedback = sequencer(&player);

        feedback.initialize().await;
        feedback.cleanup().await;
        feedback.cleanup().await;
        assert!(!feedback.is_initialized());

        assert_ok!(feedback.play_click().await);
        feedback.dispatch(FeedbackRequest::click()).wait().await;
        assert_eq!(player.kinds(), vec![CueKind::Click, CueKind::Click]);
    }

    #[tokio::test]
    async fn test_topic_tone_initializes_and_stops_first() {
        let player = Arc::new(RecordingPlayer::default());
        let feedback = sequencer(&player);

        assert_ok!(feedback.play_topic_tone(TopicTag::Active).await);

        assert!(feedback.is_initialized());
        assert_eq!(player.prepares.load(Ordering::SeqCst), 1);
        assert_eq!(player.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_without_runtime_is_dropped() {
        let player = Arc::new(RecordingPlayer::default());
        let feedback = sequencer(&player);

        let _ticket = feedback.dispatch(FeedbackRequest::click());
        let _sequence = feedback.answer_feedback(true, TopicTag::Osmosis);

        assert_eq!(feedback.active_cues(), 0);
        assert!(player.kinds().is_empty());
    }

    #[test]
    fn test_sound_info() {
        let player = Arc::new(RecordingPlayer::default());
        let feedback = sequencer(&player);
        assert_eq!(feedback.sound_info(TopicTag::Osmosis).frequency_hz, 400);
    }
}
