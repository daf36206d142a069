// ==========================================
// 库存消耗分析系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + CSV/Excel
// 系统定位: SIOP 库存分桶与处置分类（决策支持, 人工最终复核）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 报表层 - 输出
pub mod report;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 运行管道
pub mod pipeline;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{BurnDownHorizon, Category, DemandPattern, DqFlag, SkuStatus};

// 领域实体
pub use domain::{
    AllocationEntry, AllocationResult, BucketCalendar, DemandLine, RunSummary, SkuRecord,
    UsageProfile,
};

// 引擎
pub use engine::{
    classify_and_allocate, BurnDownEngine, EngineError, EngineResult, ForecastProvider, RunOutput,
};

// 配置
pub use config::{load_config, EngineConfig};

// 导入
pub use importer::{ImportError, ParallelSourceLoader, RecordSource};

// 报表
pub use report::{CsvReportWriter, ReportRow};

pub use pipeline::{run_pipeline, PipelineOutput};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "库存消耗分析系统";
