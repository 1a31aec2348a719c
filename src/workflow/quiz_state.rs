//! 测验进度状态机
//!
//! 只记录"第几题、答了什么、是否已出结果"，不认识题目内容

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::QuizError;

/// 测验所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// 正在回答第 i 题（从 0 开始）
    Answering(usize),
    /// 显示结果，直到重置
    Results,
}

/// 测验进度
///
/// 不变量：
/// - `current_index` 始终在 `[0, question_count - 1]` 内
/// - 某题的答案一旦记录，只会被覆盖，只有 `reset()` 会清除
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizState {
    question_count: usize,
    current_index: usize,
    answers: BTreeMap<usize, usize>,
    results_shown: bool,
}

impl QuizState {
    /// `question_count` 必须大于 0（由题库校验保证）
    pub fn new(question_count: usize) -> Self {
        debug_assert!(question_count > 0);
        Self {
            question_count,
            current_index: 0,
            answers: BTreeMap::new(),
            results_shown: false,
        }
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn results_shown(&self) -> bool {
        self.results_shown
    }

    pub fn answers(&self) -> &BTreeMap<usize, usize> {
        &self.answers
    }

    pub fn answer_for(&self, question: usize) -> Option<usize> {
        self.answers.get(&question).copied()
    }

    pub fn is_answered(&self, question: usize) -> bool {
        self.answers.contains_key(&question)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 == self.question_count
    }

    pub fn phase(&self) -> Phase {
        if self.results_shown {
            Phase::Results
        } else {
            Phase::Answering(self.current_index)
        }
    }

    /// 记录答案（后写覆盖先写），返回之前的答案
    pub fn record_answer(&mut self, question: usize, option: usize) -> Option<usize> {
        self.answers.insert(question, option)
    }

    /// 前进一步：下一题，或在最后一题时进入结果
    ///
    /// 当前题未作答时拒绝前进，状态不变
    pub fn advance(&mut self) -> Result<Phase, QuizError> {
        if self.results_shown {
            return Ok(Phase::Results);
        }

        if !self.is_answered(self.current_index) {
            return Err(QuizError::CurrentUnanswered {
                index: self.current_index,
            });
        }

        if self.current_index + 1 < self.question_count {
            self.current_index += 1;
        } else {
            self.results_shown = true;
        }

        Ok(self.phase())
    }

    /// 后退一步，第一题或结果阶段时不变
    pub fn retreat(&mut self) -> Phase {
        if !self.results_shown && self.current_index > 0 {
            self.current_index -= 1;
        }
        self.phase()
    }

    /// 回到初始状态
    pub fn reset(&mut self) {
        self.current_index = 0;
        self.answers.clear();
        self.results_shown = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = QuizState::new(5);
        assert_eq!(state.phase(), Phase::Answering(0));
        assert_eq!(state.answered_count(), 0);
        assert!(!state.results_shown());
    }

    #[test]
    fn test_advance_requires_answer() {
        let mut state = QuizState::new(5);
        assert_eq!(
            state.advance(),
            Err(QuizError::CurrentUnanswered { index: 0 })
        );
        assert_eq!(state.current_index(), 0);

        state.record_answer(0, 2);
        assert_eq!(state.advance(), Ok(Phase::Answering(1)));
    }

    #[test]
    fn test_advance_from_last_shows_results() {
        let mut state = QuizState::new(3);
        for i in 0..3 {
            state.record_answer(i, 0);
            state.advance().unwrap();
        }

        assert!(state.results_shown());
        assert_eq!(state.current_index(), 2);
        assert_eq!(state.phase(), Phase::Results);

        // 结果阶段再次前进不变
        assert_eq!(state.advance(), Ok(Phase::Results));
        assert_eq!(state.current_index(), 2);
    }

    #[test]
    fn test_retreat_at_first_is_noop() {
        let mut state = QuizState::new(5);
        assert_eq!(state.retreat(), Phase::Answering(0));
        assert_eq!(state.retreat(), Phase::Answering(0));

        state.record_answer(0, 1);
        state.advance().unwrap();
        assert_eq!(state.retreat(), Phase::Answering(0));
        // 后退不清除答案
        assert_eq!(state.answer_for(0), Some(1));
    }

    #[test]
    fn test_retreat_in_results_is_noop() {
        let mut state = QuizState::new(1);
        state.record_answer(0, 0);
        state.advance().unwrap();
        assert_eq!(state.retreat(), Phase::Results);
    }

    #[test]
    fn test_record_answer_overwrites() {
        let mut state = QuizState::new(5);
        assert_eq!(state.record_answer(0, 1), None);
        assert_eq!(state.record_answer(0, 2), Some(1));
        assert_eq!(state.answer_for(0), Some(2));
        assert_eq!(state.answered_count(), 1);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut state = QuizState::new(2);
        state.record_answer(0, 3);
        state.advance().unwrap();
        state.record_answer(1, 0);
        state.advance().unwrap();

        state.reset();
        assert_eq!(state, QuizState::new(2));
    }
}
