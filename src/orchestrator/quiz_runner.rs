//! 终端测验运行器 - 编排层
//!
//! ## 职责
//!
//! 1. **组合根**：创建题库、播放器、反馈服务，并负责其生命周期
//! 2. **界面循环**：从输入读取命令，驱动 `QuizSession`，渲染题目与结果
//! 3. **导航**：主页 ⇄ 测验页
//! 4. **清理**：无论如何退出，都会调用 `FeedbackSequencer::cleanup()`

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::config::Config;
use crate::infrastructure::{FeedbackRequest, LogCuePlayer};
use crate::models::question::{Language, QuestionBank};
use crate::models::topic::{tone_profile, TopicTag};
use crate::models::load_or_builtin;
use crate::services::FeedbackSequencer;
use crate::utils::logging::{log_session_summary, log_startup, truncate_text};
use crate::workflow::{Phase, QuizSession};

/// 界面
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// 主页
    Home,
    /// 测验页（作答与结果）
    Quiz,
}

/// 导航栈
#[derive(Debug)]
pub struct Navigator {
    stack: Vec<Screen>,
}

impl Navigator {
    pub fn new(root: Screen) -> Self {
        Self { stack: vec![root] }
    }

    pub fn current(&self) -> Screen {
        // 栈底的根界面永远不会弹出
        self.stack[self.stack.len() - 1]
    }

    pub fn navigate_to(&mut self, screen: Screen) {
        self.stack.push(screen);
    }

    /// 返回上一界面，已在根界面时不变
    pub fn go_back(&mut self) -> Screen {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
        self.current()
    }
}

/// 运行统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// 完成（进入结果）的测验轮数
    pub completed_rounds: usize,
    /// 最近一次完成时的得分
    pub last_score: Option<usize>,
}

/// 应用主结构
pub struct App {
    config: Config,
    bank: QuestionBank,
    feedback: FeedbackSequencer,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let bank = load_or_builtin(config.question_bank_path.as_deref()).await?;

        let source = config
            .question_bank_path
            .clone()
            .unwrap_or_else(|| "内置题库".to_string());
        log_startup(bank.len(), &source);

        let player = Arc::new(LogCuePlayer::new(config.simulate_cue_duration));
        let feedback = FeedbackSequencer::new(player, config.cue_timing());
        feedback.initialize().await;

        Ok(Self::with_parts(config, bank, feedback))
    }

    /// 使用已构建好的组件创建应用
    pub fn with_parts(config: Config, bank: QuestionBank, feedback: FeedbackSequencer) -> Self {
        Self {
            config,
            bank,
            feedback,
        }
    }

    pub fn feedback(&self) -> &FeedbackSequencer {
        &self.feedback
    }

    /// 在标准输入输出上运行
    pub async fn run(&self) -> Result<RunSummary> {
        let input = BufReader::new(tokio::io::stdin());
        let mut output = tokio::io::stdout();
        self.run_with(input, &mut output).await
    }

    /// 在给定的输入输出上运行，退出时清理反馈服务
    pub async fn run_with<R, W>(&self, input: R, output: &mut W) -> Result<RunSummary>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let result = self.event_loop(input, output).await;
        self.feedback.cleanup().await;

        if let Ok(summary) = &result {
            log_session_summary(
                summary.last_score.unwrap_or(0),
                self.bank.len(),
                summary.completed_rounds,
            );
        }
        result
    }

    async fn event_loop<R, W>(&self, input: R, out: &mut W) -> Result<RunSummary>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        let mut nav = Navigator::new(Screen::Home);
        let mut session = QuizSession::new(self.bank.clone(), self.feedback.clone());
        let mut summary = RunSummary::default();

        self.render(nav.current(), &session, out).await?;

        while let Some(line) = lines.next_line().await.context("读取输入失败")? {
            let command = line.trim();
            if command.is_empty() {
                continue;
            }
            if command.eq_ignore_ascii_case("q") {
                debug!("收到退出命令");
                break;
            }

            match nav.current() {
                Screen::Home => match command {
                    "1" => {
                        self.feedback.dispatch(FeedbackRequest::click());
                        session.reset();
                        nav.navigate_to(Screen::Quiz);
                    }
                    "2" => {
                        self.feedback.dispatch(FeedbackRequest::click());
                        for tag in TopicTag::ALL {
                            self.write_sound_info(tag, out).await?;
                        }
                        continue;
                    }
                    _ => {
                        self.write_unknown(command, out).await?;
                        continue;
                    }
                },
                Screen::Quiz => {
                    let rerender = self
                        .handle_quiz_command(command, &mut session, &mut nav, &mut summary, out)
                        .await?;
                    if !rerender {
                        continue;
                    }
                }
            }

            self.render(nav.current(), &session, out).await?;
        }

        Ok(summary)
    }

    /// 处理测验页命令，返回是否需要重新渲染
    async fn handle_quiz_command<W>(
        &self,
        command: &str,
        session: &mut QuizSession,
        nav: &mut Navigator,
        summary: &mut RunSummary,
        out: &mut W,
    ) -> Result<bool>
    where
        W: AsyncWrite + Unpin,
    {
        match (session.phase(), command) {
            (_, "b") => {
                self.feedback.dispatch(FeedbackRequest::click());
                nav.go_back();
            }
            (Phase::Answering(index), "1" | "2" | "3" | "4") => {
                let option: usize = command.parse().context("无效的选项编号")?;
                if let Err(e) = session.select_answer(index, option - 1) {
                    write_line(out, &e.to_string()).await?;
                    return Ok(false);
                }
                // 反馈序列自行运行，不等待
            }
            (Phase::Answering(_), "n") => match session.advance() {
                Ok(Phase::Results) => {
                    summary.completed_rounds += 1;
                    summary.last_score = Some(session.compute_score());
                }
                Ok(Phase::Answering(_)) => {}
                Err(e) => {
                    write_line(out, &e.to_string()).await?;
                    return Ok(false);
                }
            },
            (Phase::Answering(_), "p") => {
                session.retreat();
            }
            (Phase::Answering(_), "i") => {
                self.write_sound_info(session.current_question().topic, out).await?;
                return Ok(false);
            }
            (Phase::Results, "r") => {
                self.feedback.dispatch(FeedbackRequest::click());
                session.reset();
            }
            _ => {
                self.write_unknown(command, out).await?;
                return Ok(false);
            }
        }

        Ok(true)
    }

    async fn render<W>(&self, screen: Screen, session: &QuizSession, out: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let lang = self.config.language;
        match screen {
            Screen::Home => {
                write_line(out, "").await?;
                let title = tr(
                    lang,
                    "النقل عبر الغشاء الخلوي",
                    "Transport across the cell membrane",
                );
                write_line(out, title).await?;

                let start = tr(lang, "ابدأ الاختبار", "Start the quiz");
                write_line(out, &format!("  1) {}", start)).await?;
                let sounds = tr(lang, "معلومات الأصوات", "Sound info");
                write_line(out, &format!("  2) {}", sounds)).await?;
                write_line(out, &format!("  q) {}", tr(lang, "خروج", "Quit"))).await?;
            }
            Screen::Quiz => match session.phase() {
                Phase::Answering(index) => self.render_question(index, session, out).await?,
                Phase::Results => self.render_results(session, out).await?,
            },
        }
        out.flush().await?;
        Ok(())
    }

    async fn render_question<W>(
        &self,
        index: usize,
        session: &QuizSession,
        out: &mut W,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let lang = self.config.language;
        let question = session.current_question();
        let (current, total) = session.progress();
        let selected = session.state().answer_for(index);

        info!(
            "[题目 {}/{}] {}",
            current,
            total,
            truncate_text(&question.prompt.ar, 40)
        );

        write_line(out, "").await?;
        let header = format!(
            "{} {} / {}  {}",
            tr(lang, "السؤال", "Question"),
            current,
            total,
            progress_bar(current, total)
        );
        write_line(out, &header).await?;
        write_line(out, question.prompt.get(lang)).await?;
        for (i, option) in question.options.iter().enumerate() {
            let marker = if selected == Some(i) { "●" } else { "○" };
            write_line(out, &format!("  {} {}) {}", marker, i + 1, option.get(lang))).await?;
        }

        let next = if session.is_last_question() {
            tr(lang, "إنهاء", "Finish")
        } else {
            tr(lang, "التالي", "Next")
        };
        write_line(
            out,
            &format!(
                "[1-4] | n) {} | p) {} | i) {} | b) {} | q)",
                next,
                tr(lang, "السابق", "Previous"),
                tr(lang, "الصوت", "Sound"),
                tr(lang, "رجوع", "Back"),
            ),
        )
        .await?;
        Ok(())
    }

    async fn render_results<W>(&self, session: &QuizSession, out: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let lang = self.config.language;
        let report = session.report(lang);

        write_line(out, "").await?;
        write_line(out, tr(lang, "نتائج الاختبار", "Quiz results")).await?;
        let score = format!(
            "{} {} {} ({}%)",
            report.score,
            tr(lang, "من", "of"),
            report.total,
            report.percentage
        );
        write_line(out, &score).await?;
        write_line(out, &report.message).await?;

        write_line(out, tr(lang, "مراجعة الإجابات", "Answer review")).await?;
        let question_label = tr(lang, "السؤال", "Question");
        let correct_label = tr(lang, "الإجابة الصحيحة", "Correct answer");
        for item in &report.review {
            let mark = if item.is_correct { "✓" } else { "✗" };
            write_line(
                out,
                &format!("{} {} {}: {}", mark, question_label, item.number, item.prompt),
            )
            .await?;
            write_line(out, &format!("    {}: {}", correct_label, item.correct_answer)).await?;
            write_line(out, &format!("    {}", item.explanation)).await?;
        }

        if self.config.report_json {
            let json = serde_json::to_string_pretty(&report).context("无法序列化成绩报告")?;
            write_line(out, &json).await?;
        }

        write_line(
            out,
            &format!(
                "r) {} | b) {} | q)",
                tr(lang, "إعادة الاختبار", "Retake quiz"),
                tr(lang, "العودة للرئيسية", "Back to home"),
            ),
        )
        .await?;
        Ok(())
    }

    async fn write_sound_info<W>(&self, tag: TopicTag, out: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let profile = tone_profile(tag);
        write_line(
            out,
            &format!(
                "♪ {}: {}Hz, {:.1}s, {} ({})",
                tag.title(self.config.language),
                profile.frequency_hz,
                profile.duration_ms as f64 / 1000.0,
                profile.description,
                profile.pattern
            ),
        )
        .await?;
        self.feedback.dispatch(FeedbackRequest::topic_tone(tag));
        Ok(())
    }

    async fn write_unknown<W>(&self, command: &str, out: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let lang = self.config.language;
        let label = tr(lang, "أمر غير معروف", "Unknown command");
        write_line(out, &format!("{}: {}", label, command)).await
    }
}

fn tr(lang: Language, ar: &'static str, en: &'static str) -> &'static str {
    match lang {
        Language::Arabic => ar,
        Language::English => en,
    }
}

fn progress_bar(current: usize, total: usize) -> String {
    let width = 10;
    let filled = current * width / total.max(1);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

async fn write_line<W>(out: &mut W, text: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    Ok(())
}
