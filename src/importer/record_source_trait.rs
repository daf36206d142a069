// ==========================================
// 库存消耗分析系统 - 数据源 Trait
// ==========================================
// 职责: 定义数据源接口（不包含实现）
// ==========================================

use crate::importer::error::ImportResult;
use crate::importer::record_assembler::LoadOutcome;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

/// 原始行记录（列名 → 值）
pub type RawRow = HashMap<String, String>;

// ==========================================
// RecordSource Trait
// ==========================================
// 用途: SKU 快照数据源主接口
// 实现者: ParallelSourceLoader
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// 加载全部 SKU 快照
    ///
    /// # 返回
    /// - Ok(LoadOutcome): 组装好的记录 + 被拒绝行 + 孤儿行统计
    /// - Err: 文件/数据库读取错误、类型转换错误（整个数据源不可用）
    async fn load_records(&self) -> ImportResult<LoadOutcome>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行记录
    ///
    /// # 参数
    /// - file_path: 文件路径
    ///
    /// # 返回
    /// - Ok(Vec<RawRow>): 行记录列表（已跳过全空行）
    /// - Err: 文件读取错误、格式错误
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRow>>;
}
