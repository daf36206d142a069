// ==========================================
// 库存消耗分析系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 行级缺主键/缺在库不在此处报错, 由 RecordAssembler 转为校验跳过
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 数据映射错误 =====
    #[error("类型转换失败 ({table} 行 {row}, 字段 {field}): {message}")]
    TypeConversionError {
        table: String,
        row: usize,
        field: String,
        message: String,
    },

    #[error("日期格式错误 ({table} 行 {row}, 字段 {field}): 期望 YYYY-MM-DD / YYYYMMDD，实际 {value}")]
    DateFormatError {
        table: String,
        row: usize,
        field: String,
        value: String,
    },

    #[error("期间格式错误 (usage 行 {row}): 期望 YYYY-MM，实际 {value}")]
    PeriodFormatError { row: usize, value: String },

    // ===== 数据源错误 =====
    #[error("数据表不存在: {0}")]
    TableNotFound(String),

    #[error("数据表名非法: {0}")]
    InvalidTableName(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("加载任务异常终止: {0}")]
    TaskJoinError(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::DatabaseQueryError(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ImportError {
    fn from(err: tokio::task::JoinError) -> Self {
        ImportError::TaskJoinError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_maps_to_read_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ImportError = io.into();
        assert!(matches!(err, ImportError::FileReadError(_)));
    }

    #[test]
    fn test_error_messages_carry_location() {
        let err = ImportError::TypeConversionError {
            table: "inventory".to_string(),
            row: 3,
            field: "on_hand".to_string(),
            message: "无法解析为数值: abc".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("inventory"));
        assert!(text.contains("行 3"));
        assert!(text.contains("on_hand"));
    }
}
