use crate::error::{AppError, FileError};
use crate::models::question::{QuestionBank, QuestionBankFile};
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 从 TOML 文本解析并校验题库
pub fn parse_question_bank(content: &str) -> Result<QuestionBank> {
    let file: QuestionBankFile = toml::from_str(content).map_err(AppError::from)?;
    let bank = QuestionBank::new(file.questions).map_err(AppError::from)?;
    Ok(bank)
}

/// 从 TOML 文件加载题库
pub async fn load_question_bank(path: &Path) -> Result<QuestionBank> {
    if !path.exists() {
        return Err(AppError::File(FileError::NotFound {
            path: path.display().to_string(),
        })
        .into());
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    let file: QuestionBankFile = toml::from_str(&content)
        .map_err(|e| AppError::toml_parse_failed(path.display().to_string(), e))?;

    let bank = QuestionBank::new(file.questions)
        .map_err(AppError::from)
        .with_context(|| format!("题库校验失败: {}", path.display()))?;

    tracing::info!(
        "成功加载 {} 个题目: {}",
        bank.len(),
        path.file_name().unwrap_or_default().to_string_lossy()
    );

    Ok(bank)
}

/// 配置了路径时从文件加载，否则使用内置题库
pub async fn load_or_builtin(path: Option<&str>) -> Result<QuestionBank> {
    match path {
        Some(path) => {
            tracing::info!("📁 正在加载题库文件: {}", path);
            load_question_bank(Path::new(path)).await
        }
        None => {
            tracing::info!("📁 使用内置题库");
            QuestionBank::builtin().context("内置题库无效")
        }
    }
}
