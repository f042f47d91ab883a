use thiserror::Error;

/// # Summary
/// 渲染域错误枚举。
///
/// # Invariants
/// - 单个样本的问题不产生错误（按空白记录处理），这里只覆盖调用契约层面的失败。
#[derive(Error, Debug, PartialEq)]
pub enum RenderError {
    // 数据或选项的指标类型与渲染器类型不一致
    #[error("Indicator kind mismatch: expected {expected}, got {actual}")]
    KindMismatch { expected: String, actual: String },
    // 未知的指标类型字符串
    #[error("Unknown indicator kind: {0}")]
    UnknownKind(String),
    // 选项值非法，例如负线宽
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}
