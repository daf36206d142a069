// ==========================================
// 库存消耗分析系统 - 导入层
// ==========================================
// 职责: 外部数据导入, 组装为 SkuRecord
// 支持: Excel, CSV, SQLite 数据表
// ==========================================

pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod raw_record;
pub mod record_assembler;
pub mod record_source_trait;
pub mod source_loader;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use field_mapper::{parse_period, FieldMapper};
pub use file_parser::{CsvParser, ExcelParser, SqliteTableParser, UniversalFileParser};
pub use raw_record::{RawDemandRow, RawInventoryRow, RawUsageRow};
pub use record_assembler::{LoadOutcome, RecordAssembler};
pub use source_loader::{MemorySource, ParallelSourceLoader, TableLocator};

// 重导出 Trait 接口
pub use record_source_trait::{FileParser, RawRow, RecordSource};
