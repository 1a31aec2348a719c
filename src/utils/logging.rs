/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// `RUST_LOG` 优先；否则默认 info，详细模式为 debug。重复调用无副作用。
///
/// # 参数
/// - `verbose`: 是否输出详细日志
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `question_count`: 题目数量
/// - `source`: 题库来源
pub fn log_startup(question_count: usize, source: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 细胞膜物质运输测验");
    info!(
        "🕒 启动时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("📚 题库: {} ({} 道题)", source, question_count);
    info!("{}", "=".repeat(60));
}

/// 打印测验结束统计
///
/// # 参数
/// - `score`: 答对数量
/// - `total`: 题目总数
/// - `attempts`: 完成的测验轮数
pub fn log_session_summary(score: usize, total: usize, attempts: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 测验统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 最近一次得分: {}/{}", score, total);
    info!("🔁 完成轮数: {}", attempts);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
