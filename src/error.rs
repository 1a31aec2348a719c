use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 题库相关错误
    Bank(BankError),
    /// 文件操作错误
    File(FileError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Bank(e) => write!(f, "题库错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Bank(e) => Some(e),
            AppError::File(e) => Some(e),
        }
    }
}

/// 题库校验错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankError {
    /// 题库为空
    Empty,
    /// 选项数量不正确
    WrongOptionCount {
        id: u32,
        expected: usize,
        actual: usize,
    },
    /// 正确答案索引超出范围
    CorrectOutOfRange {
        id: u32,
        correct: usize,
        option_count: usize,
    },
    /// 题干为空
    EmptyPrompt {
        id: u32,
    },
    /// 题目ID重复
    DuplicateId {
        id: u32,
    },
}

impl fmt::Display for BankError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BankError::Empty => write!(f, "题库中没有任何题目"),
            BankError::WrongOptionCount {
                id,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "题目 {} 的选项数量应为 {}，实际为 {}",
                    id, expected, actual
                )
            }
            BankError::CorrectOutOfRange {
                id,
                correct,
                option_count,
            } => {
                write!(
                    f,
                    "题目 {} 的正确答案索引 {} 超出范围 [0, {})",
                    id, correct, option_count
                )
            }
            BankError::EmptyPrompt { id } => write!(f, "题目 {} 的题干为空", id),
            BankError::DuplicateId { id } => write!(f, "题目ID重复: {}", id),
        }
    }
}

impl std::error::Error for BankError {}

/// 测验流程错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
    /// 题目索引超出范围
    QuestionOutOfRange {
        index: usize,
        count: usize,
    },
    /// 选项索引超出范围
    OptionOutOfRange {
        question: usize,
        option: usize,
        option_count: usize,
    },
    /// 当前题目尚未作答，不能前进
    CurrentUnanswered {
        index: usize,
    },
    /// 已显示结果，需先重置
    ResultsShown,
}

impl fmt::Display for QuizError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizError::QuestionOutOfRange { index, count } => {
                write!(f, "题目索引 {} 超出范围 [0, {})", index, count)
            }
            QuizError::OptionOutOfRange {
                question,
                option,
                option_count,
            } => {
                write!(
                    f,
                    "题目 {} 的选项索引 {} 超出范围 [0, {})",
                    question, option, option_count
                )
            }
            QuizError::CurrentUnanswered { index } => {
                write!(f, "题目 {} 尚未作答，不能进入下一题", index + 1)
            }
            QuizError::ResultsShown => write!(f, "测验已结束，请先重置"),
        }
    }
}

impl std::error::Error for QuizError {}

/// 文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 文件不存在
    NotFound {
        path: String,
    },
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 解析失败
    TomlParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::NotFound { path } => write!(f, "文件不存在: {}", path),
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::TomlParseFailed { path, source } => {
                write!(f, "TOML解析失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. }
            | FileError::TomlParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            FileError::NotFound { .. } => None,
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 环境变量解析失败
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => {
                write!(
                    f,
                    "环境变量 {} 解析失败: 值 '{}' 无法转换为 {}",
                    var_name, value, expected_type
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ========== 从常见错误类型转换 ==========

impl From<BankError> for AppError {
    fn from(err: BankError) -> Self {
        AppError::Bank(err)
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::File(FileError::TomlParseFailed {
            path: String::new(), // TOML错误不包含路径信息
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建 TOML 解析错误
    pub fn toml_parse_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::TomlParseFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
