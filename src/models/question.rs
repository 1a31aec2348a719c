use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::BankError;
use crate::models::topic::TopicTag;

/// 每道题的选项数量
pub const OPTION_COUNT: usize = 4;

/// 内置题库（阿拉伯语 + 英语）
const BUILTIN_BANK: &str = include_str!("../../data/questions.toml");

/// 显示语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// 阿拉伯语（原文）
    #[default]
    Arabic,
    /// 英语（译文）
    English,
}

/// 双语文本，英语缺失时回退到阿拉伯语
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub ar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en: Option<String>,
}

impl LocalizedText {
    pub fn new(ar: impl Into<String>, en: Option<&str>) -> Self {
        Self {
            ar: ar.into(),
            en: en.map(str::to_string),
        }
    }

    /// 按语言取文本
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::Arabic => &self.ar,
            Language::English => self.en.as_deref().unwrap_or(&self.ar),
        }
    }
}

/// 单道测验题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub prompt: LocalizedText,
    pub options: Vec<LocalizedText>,
    /// 正确选项索引，范围 [0, 3]
    pub correct: usize,
    pub explanation: LocalizedText,
    pub topic: TopicTag,
}

impl Question {
    /// 判断选项是否正确
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct
    }

    /// 正确选项的文本，未经题库校验的题目可能没有
    pub fn correct_option(&self) -> Option<&LocalizedText> {
        self.options.get(self.correct)
    }

    fn validate(&self) -> Result<(), BankError> {
        if self.prompt.ar.trim().is_empty() {
            return Err(BankError::EmptyPrompt { id: self.id });
        }
        if self.options.len() != OPTION_COUNT {
            return Err(BankError::WrongOptionCount {
                id: self.id,
                expected: OPTION_COUNT,
                actual: self.options.len(),
            });
        }
        if self.correct >= self.options.len() {
            return Err(BankError::CorrectOutOfRange {
                id: self.id,
                correct: self.correct,
                option_count: self.options.len(),
            });
        }
        Ok(())
    }
}

/// 题库文件的原始结构
#[derive(Debug, Deserialize)]
pub(crate) struct QuestionBankFile {
    pub questions: Vec<Question>,
}

/// 不可变的有序题库
///
/// 构造时完成校验，之后通过 `Arc` 在会话之间共享。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Arc<[Question]>,
}

impl QuestionBank {
    /// 校验并创建题库
    pub fn new(questions: Vec<Question>) -> Result<Self, BankError> {
        if questions.is_empty() {
            return Err(BankError::Empty);
        }

        let mut seen = HashSet::new();
        for question in &questions {
            question.validate()?;
            if !seen.insert(question.id) {
                return Err(BankError::DuplicateId { id: question.id });
            }
        }

        Ok(Self {
            questions: questions.into(),
        })
    }

    /// 内置的五道题
    pub fn builtin() -> crate::error::AppResult<Self> {
        let file: QuestionBankFile = toml::from_str(BUILTIN_BANK)?;
        Ok(Self::new(file.questions)?)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: u32, correct: usize, option_count: usize) -> Question {
        Question {
            id,
            prompt: LocalizedText::new("سؤال", Some("question")),
            options: (0..option_count)
                .map(|i| LocalizedText::new(format!("خيار {}", i), None))
                .collect(),
            correct,
            explanation: LocalizedText::new("شرح", None),
            topic: TopicTag::Diffusion,
        }
    }

    #[test]
    fn test_builtin_bank() {
        let bank = QuestionBank::builtin().unwrap();
        assert_eq!(bank.len(), 5);

        let correct: Vec<usize> = bank.iter().map(|q| q.correct).collect();
        assert_eq!(correct, vec![1, 1, 2, 2, 1]);

        let topics: Vec<TopicTag> = bank.iter().map(|q| q.topic).collect();
        assert_eq!(
            topics,
            vec![
                TopicTag::Diffusion,
                TopicTag::Osmosis,
                TopicTag::Active,
                TopicTag::Diffusion,
                TopicTag::Osmosis,
            ]
        );
    }

    #[test]
    fn test_builtin_bank_is_bilingual() {
        let bank = QuestionBank::builtin().unwrap();
        for q in bank.iter() {
            assert!(q.prompt.en.is_some(), "题目 {} 缺少英语译文", q.id);
            assert!(q.options.iter().all(|o| o.en.is_some()));
        }
    }

    #[test]
    fn test_correct_option_out_of_range() {
        let q = question(1, 2, 4);
        assert_eq!(q.correct_option().map(|o| o.ar.as_str()), Some("خيار 2"));

        let q = question(2, 5, 4);
        assert_eq!(q.correct_option(), None);
        assert!(!q.is_correct(0));
    }

    #[test]
    fn test_localized_text_fallback() {
        let text = LocalizedText::new("الماء", None);
        assert_eq!(text.get(Language::English), "الماء");

        let text = LocalizedText::new("الماء", Some("Water"));
        assert_eq!(text.get(Language::English), "Water");
        assert_eq!(text.get(Language::Arabic), "الماء");
    }

    #[test]
    fn test_rejects_invalid_banks() {
        assert_eq!(QuestionBank::new(vec![]), Err(BankError::Empty));

        assert_eq!(
            QuestionBank::new(vec![question(1, 0, 3)]),
            Err(BankError::WrongOptionCount {
                id: 1,
                expected: 4,
                actual: 3
            })
        );

        assert_eq!(
            QuestionBank::new(vec![question(1, 4, 4)]),
            Err(BankError::CorrectOutOfRange {
                id: 1,
                correct: 4,
                option_count: 4
            })
        );

        assert_eq!(
            QuestionBank::new(vec![question(7, 0, 4), question(7, 1, 4)]),
            Err(BankError::DuplicateId { id: 7 })
        );

        let mut blank = question(2, 0, 4);
        blank.prompt = LocalizedText::new("  ", None);
        assert_eq!(
            QuestionBank::new(vec![blank]),
            Err(BankError::EmptyPrompt { id: 2 })
        );
    }
}
