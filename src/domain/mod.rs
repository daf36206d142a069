// ==========================================
// 库存消耗分析系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod allocation;
pub mod sku;
pub mod summary;
pub mod types;
pub mod usage;

// 重导出核心类型
pub use allocation::{
    AllocationEntry, AllocationResult, Bucket, BucketCalendar, BucketKind, NEVER_LABEL,
    PAST_DUE_LABEL,
};
pub use sku::{DemandLine, SkuRecord};
pub use summary::RunSummary;
pub use types::{BurnDownHorizon, Category, DemandPattern, DqFlag, SkuStatus};
pub use usage::UsageProfile;
