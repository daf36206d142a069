// ==========================================
// 库存消耗分析系统 - 引擎错误类型
// ==========================================
// 工具: thiserror 派生宏
// 传播策略:
// - Validation / ConservationViolation: 单条记录隔离, 运行继续
// - Configuration: 运行开始前失败, 不处理任何记录
// ==========================================

use rust_decimal::Decimal;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    // ===== 记录级错误 =====
    #[error("记录校验失败 (sku: {sku}, 字段 {field}): {message}")]
    Validation {
        sku: String,
        field: String,
        message: String,
    },

    #[error("守恒校验失败 (sku: {sku}): 在库 {on_hand}, 已分配 {allocated}")]
    ConservationViolation {
        sku: String,
        on_hand: Decimal,
        allocated: Decimal,
    },

    // ===== 运行级错误 =====
    #[error("配置错误 (key: {key}): {message}")]
    Configuration { key: String, message: String },
}

impl EngineError {
    pub fn validation(
        sku: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        EngineError::Validation {
            sku: sku.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn configuration(key: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Configuration {
            key: key.into(),
            message: message.into(),
        }
    }

    /// 是否为运行级致命错误
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Configuration { .. })
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
