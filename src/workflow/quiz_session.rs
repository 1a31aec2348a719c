//! 测验会话 - 流程层
//!
//! 核心职责：一次测验的完整流程
//!
//! 流程顺序：
//! 1. 选择答案 → 记录 → 派发反馈序列（不等待）
//! 2. 下一题 / 上一题
//! 3. 最后一题后进入结果：得分、评级、逐题回顾
//!
//! 反馈提示失败不影响任何状态变更。

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::QuizError;
use crate::infrastructure::FeedbackRequest;
use crate::models::question::{Language, Question, QuestionBank};
use crate::models::topic::TopicTag;
use crate::services::{FeedbackSequencer, SequenceHandle};
use crate::workflow::quiz_state::{Phase, QuizState};

/// 一次选择答案的结果
#[derive(Debug)]
pub struct AnswerOutcome {
    /// 是否答对
    pub correct: bool,
    /// 覆盖前的答案（重复作答时）
    pub previous: Option<usize>,
    /// 本次派发的反馈序列，可忽略
    pub feedback: SequenceHandle,
}

/// 成绩评级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScoreGrade {
    /// ≥ 80%
    Excellent,
    /// ≥ 60%
    Good,
    /// 其余
    NeedsReview,
}

impl ScoreGrade {
    /// 按未取整的百分比评级
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 80.0 {
            ScoreGrade::Excellent
        } else if percentage >= 60.0 {
            ScoreGrade::Good
        } else {
            ScoreGrade::NeedsReview
        }
    }

    pub fn message(self, language: Language) -> &'static str {
        match (self, language) {
            (ScoreGrade::Excellent, Language::Arabic) => "ممتاز! لديك فهم جيد للموضوع",
            (ScoreGrade::Good, Language::Arabic) => "جيد! يمكنك المراجعة لتحسين النتيجة",
            (ScoreGrade::NeedsReview, Language::Arabic) => "تحتاج للمزيد من المراجعة",
            (ScoreGrade::Excellent, Language::English) => {
                "Excellent! You have a good understanding of the topic"
            }
            (ScoreGrade::Good, Language::English) => "Good! Review to improve your score",
            (ScoreGrade::NeedsReview, Language::English) => "You need more review",
        }
    }
}

/// 结果页中单道题的回顾
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewItem {
    /// 题号（从 1 开始）
    pub number: usize,
    pub prompt: String,
    pub chosen: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: String,
    pub topic: TopicTag,
}

/// 可序列化的成绩报告
#[derive(Debug, Clone, Serialize)]
pub struct QuizReport {
    pub score: usize,
    pub total: usize,
    pub percentage: u32,
    pub grade: ScoreGrade,
    pub message: String,
    pub review: Vec<ReviewItem>,
}

/// 测验会话
///
/// - 持有题库与进度，由测验界面独占
/// - 反馈服务由组合根注入
pub struct QuizSession {
    bank: QuestionBank,
    state: QuizState,
    feedback: FeedbackSequencer,
}

impl QuizSession {
    /// 创建新的测验会话
    pub fn new(bank: QuestionBank, feedback: FeedbackSequencer) -> Self {
        let state = QuizState::new(bank.len());
        Self {
            bank,
            state,
            feedback,
        }
    }

    pub fn state(&self) -> &QuizState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn question_count(&self) -> usize {
        self.bank.len()
    }

    pub fn current_question(&self) -> &Question {
        // current_index 始终在题库范围内
        &self.bank.questions()[self.state.current_index()]
    }

    pub fn is_last_question(&self) -> bool {
        self.state.is_last_question()
    }

    /// 进度 (当前题号, 总题数)，题号从 1 开始
    pub fn progress(&self) -> (usize, usize) {
        (self.state.current_index() + 1, self.bank.len())
    }

    /// 选择答案
    ///
    /// 重复作答会覆盖之前的答案并再次触发完整的反馈序列
    pub fn select_answer(
        &mut self,
        question_index: usize,
        option_index: usize,
    ) -> Result<AnswerOutcome, QuizError> {
        if self.state.results_shown() {
            warn!("⚠️ 测验已结束，忽略作答 (题目 {})", question_index + 1);
            return Err(QuizError::ResultsShown);
        }

        let question = self.bank.get(question_index).ok_or_else(|| {
            warn!("⚠️ 题目索引 {} 超出范围", question_index);
            QuizError::QuestionOutOfRange {
                index: question_index,
                count: self.bank.len(),
            }
        })?;

        if option_index >= question.options.len() {
            warn!(
                "⚠️ 题目 {} 的选项索引 {} 超出范围",
                question_index + 1,
                option_index
            );
            return Err(QuizError::OptionOutOfRange {
                question: question_index,
                option: option_index,
                option_count: question.options.len(),
            });
        }

        let correct = question.is_correct(option_index);
        let topic = question.topic;

        let previous = self.state.record_answer(question_index, option_index);
        match previous {
            Some(old) => info!(
                "题目 {} 重新作答: {} → {}",
                question_index + 1,
                old + 1,
                option_index + 1
            ),
            None => debug!("题目 {} 作答: {}", question_index + 1, option_index + 1),
        }

        let feedback = self.feedback.answer_feedback(correct, topic);

        Ok(AnswerOutcome {
            correct,
            previous,
            feedback,
        })
    }

    /// 下一题；最后一题时进入结果
    ///
    /// 已在结果页时不变，也不触发提示
    pub fn advance(&mut self) -> Result<Phase, QuizError> {
        let before = self.state.phase();
        let phase = self.state.advance()?;
        if phase == before {
            return Ok(phase);
        }
        self.feedback.dispatch(FeedbackRequest::click());

        if phase == Phase::Results {
            info!(
                "📊 测验完成: {}/{}",
                self.compute_score(),
                self.question_count()
            );
        }
        Ok(phase)
    }

    /// 上一题；第一题时不变
    pub fn retreat(&mut self) -> Phase {
        let before = self.state.phase();
        let after = self.state.retreat();
        if before != after {
            self.feedback.dispatch(FeedbackRequest::click());
        }
        after
    }

    /// 重新开始
    pub fn reset(&mut self) {
        self.state.reset();
        info!("🔄 测验已重置");
    }

    /// 答对的题数，未作答的题不计
    pub fn compute_score(&self) -> usize {
        self.bank
            .iter()
            .enumerate()
            .filter(|(i, q)| self.state.answer_for(*i) == Some(q.correct))
            .count()
    }

    /// 得分百分比（四舍五入，仅用于显示）
    pub fn percentage(&self) -> u32 {
        self.raw_percentage().round() as u32
    }

    pub fn grade(&self) -> ScoreGrade {
        ScoreGrade::from_percentage(self.raw_percentage())
    }

    fn raw_percentage(&self) -> f64 {
        self.compute_score() as f64 / self.bank.len() as f64 * 100.0
    }

    /// 逐题回顾
    pub fn review(&self, language: Language) -> Vec<ReviewItem> {
        self.bank
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let chosen = self.state.answer_for(i);
                ReviewItem {
                    number: i + 1,
                    prompt: q.prompt.get(language).to_string(),
                    chosen: chosen
                        .and_then(|o| q.options.get(o))
                        .map(|o| o.get(language).to_string()),
                    correct_answer: q
                        .correct_option()
                        .map(|o| o.get(language).to_string())
                        .unwrap_or_default(),
                    is_correct: chosen == Some(q.correct),
                    explanation: q.explanation.get(language).to_string(),
                    topic: q.topic,
                }
            })
            .collect()
    }

    /// 成绩报告
    pub fn report(&self, language: Language) -> QuizReport {
        let grade = self.grade();
        QuizReport {
            score: self.compute_score(),
            total: self.bank.len(),
            percentage: self.percentage(),
            grade,
            message: grade.message(language).to_string(),
            review: self.review(language),
        }
    }
}
