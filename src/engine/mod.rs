// ==========================================
// 库存消耗分析系统 - 引擎层
// ==========================================
// 职责: 用量画像、处置分类、时间桶分配、消耗区间判定
// 红线: 引擎不做 IO, 所有分类必须输出命中规则
// ==========================================

pub mod allocator;
pub mod burn_down;
pub mod classification;
pub mod error;
pub mod forecast;
pub mod orchestrator;
pub mod segmentation;
pub mod usage;

// 重导出核心引擎
pub use allocator::{TimeBucketAllocator, RATE_SCALE};
pub use burn_down::BurnDownCategorizer;
pub use classification::{Classification, ClassificationEngine, ClassificationRule, RuleContext};
pub use error::{EngineError, EngineResult};
pub use forecast::{adjust_forecast, burn_rates, cap_to_last_year, ForecastProvider, NoForecast, StaticForecast};
pub use orchestrator::{
    allocate_sku, classify_and_allocate, validate_record, BurnDownEngine, RunOutput,
};
pub use segmentation::{classify_pattern, PatternStats};
pub use usage::UsageCalculator;
