// ==========================================
// 库存消耗分析系统 - 引擎编排
// ==========================================
// 职责: 单 SKU 纯函数 classify_and_allocate + 全量批处理
// 流程: 校验 → 用量画像 → 分类 → 消耗速率 → 分桶 → 守恒校验 → 消耗区间
// 红线: SKU 之间无共享可变状态; 单 SKU 失败不影响整批
// ==========================================

use crate::config::EngineConfig;
use crate::domain::allocation::{AllocationResult, BucketCalendar};
use crate::domain::sku::SkuRecord;
use crate::domain::summary::RunSummary;
use crate::domain::types::DqFlag;
use crate::domain::usage::UsageProfile;
use crate::engine::allocator::TimeBucketAllocator;
use crate::engine::burn_down::BurnDownCategorizer;
use crate::engine::classification::{ClassificationEngine, RuleContext};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::forecast::{burn_rates, ForecastProvider, NoForecast};
use crate::engine::usage::UsageCalculator;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashSet;
use tracing::{debug, error, info, instrument, warn};

/// 记录级校验（缺失主键/数量为负/完工百分比越界）
pub fn validate_record(record: &SkuRecord) -> EngineResult<()> {
    if record.sku.trim().is_empty() {
        return Err(EngineError::validation("", "sku", "主键缺失"));
    }
    if record.on_hand < Decimal::ZERO {
        return Err(EngineError::validation(
            &record.sku,
            "on_hand",
            format!("在库数量为负: {}", record.on_hand),
        ));
    }
    if let Some(poc) = record.poc {
        if poc < Decimal::ZERO || poc > dec!(100) {
            return Err(EngineError::validation(
                &record.sku,
                "poc",
                format!("完工百分比超出范围 [0, 100]: {}", poc),
            ));
        }
    }
    if let Some(cost) = record.unit_cost {
        if cost < Decimal::ZERO {
            return Err(EngineError::validation(
                &record.sku,
                "unit_cost",
                format!("单位成本为负: {}", cost),
            ));
        }
        if record.on_hand.checked_mul(cost).is_none() {
            return Err(EngineError::validation(
                &record.sku,
                "unit_cost",
                format!("在库金额溢出: {} × {}", record.on_hand, cost),
            ));
        }
    }
    if let Some(line) = record.demands.iter().find(|d| d.quantity < Decimal::ZERO) {
        return Err(EngineError::validation(
            &record.sku,
            "demand.quantity",
            format!("需求数量为负 (工单 {}): {}", line.order_id, line.quantity),
        ));
    }
    Ok(())
}

/// 单 SKU 分类 + 分配（无预测, 按历史均值消耗）
pub fn classify_and_allocate(
    record: &SkuRecord,
    profile: &UsageProfile,
    config: &EngineConfig,
) -> EngineResult<AllocationResult> {
    let calendar = BucketCalendar::new(config.as_of, config.horizon_months);
    allocate_sku(record, profile, config, &calendar, None)
}

/// 单 SKU 分类 + 分配（可选外部预测）
pub fn allocate_sku(
    record: &SkuRecord,
    profile: &UsageProfile,
    config: &EngineConfig,
    calendar: &BucketCalendar,
    forecast: Option<&[Decimal]>,
) -> EngineResult<AllocationResult> {
    validate_record(record)?;

    // === 步骤 1: 分类 ===
    let classification = ClassificationEngine::new().classify(&RuleContext {
        record,
        profile,
        config,
    });

    // === 步骤 2: 消耗速率 ===
    let horizon = calendar.last_month_index();
    let rates = burn_rates(
        profile,
        &record.usage_history,
        forecast,
        horizon,
        config.forecast_cap_multiplier,
    );

    // === 步骤 3: 分桶 ===
    let entries = TimeBucketAllocator::new().allocate(
        record,
        profile,
        classification.category,
        &rates,
        calendar,
    );

    // === 步骤 4: 守恒校验 ===
    let allocated: Decimal = entries.iter().map(|e| e.quantity).sum();
    if allocated != record.on_hand {
        return Err(EngineError::ConservationViolation {
            sku: record.sku.clone(),
            on_hand: record.on_hand,
            allocated,
        });
    }

    // === 步骤 5: 消耗区间 ===
    let categorizer = BurnDownCategorizer::new();
    let horizon_label =
        categorizer.categorize(&entries, record.on_hand, profile.is_zero_usage(), calendar);

    let excess: Decimal = entries
        .iter()
        .filter(|e| !e.category.is_essential())
        .map(|e| e.quantity)
        .sum();
    let burn_down_years = categorizer.burn_down_years(&record.sku, excess, profile.average)?;

    let mut flags: Vec<DqFlag> = record
        .load_flags
        .iter()
        .chain(profile.flags.iter())
        .chain(classification.flags.iter())
        .copied()
        .collect();
    flags.sort();
    flags.dedup();

    Ok(AllocationResult {
        sku: record.sku.clone(),
        on_hand: record.on_hand,
        category: classification.category,
        rule_id: classification.rule_id.to_string(),
        hold: classification.hold,
        pattern: profile.pattern,
        entries,
        horizon: horizon_label,
        burn_down_years,
        unit_cost: record.unit_cost,
        flags,
    })
}

// ==========================================
// RunOutput - 批处理输出
// ==========================================
#[derive(Debug)]
pub struct RunOutput {
    /// 成功结果（保持输入顺序）
    pub results: Vec<AllocationResult>,
    /// 被跳过/失败的记录错误
    pub errors: Vec<EngineError>,
    pub summary: RunSummary,
}

// ==========================================
// BurnDownEngine - 批处理引擎
// ==========================================
pub struct BurnDownEngine {
    config: EngineConfig,
    calendar: BucketCalendar,
    calculator: UsageCalculator,
    forecast: Box<dyn ForecastProvider>,
}

impl BurnDownEngine {
    /// 创建引擎; 配置非法时直接失败（不处理任何记录）
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let calendar = BucketCalendar::new(config.as_of, config.horizon_months);
        let calculator = UsageCalculator::from_config(&config);
        Ok(Self {
            config,
            calendar,
            calculator,
            forecast: Box::new(NoForecast),
        })
    }

    /// 接入外部预测
    pub fn with_forecast_provider(mut self, provider: Box<dyn ForecastProvider>) -> Self {
        self.forecast = provider;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn calendar(&self) -> &BucketCalendar {
        &self.calendar
    }

    /// 计算单 SKU 用量画像
    pub fn profile(&self, record: &SkuRecord) -> EngineResult<UsageProfile> {
        self.calculator.compute(record)
    }

    /// 处理单个 SKU
    pub fn process(&self, record: &SkuRecord) -> EngineResult<AllocationResult> {
        let profile = self.calculator.compute(record)?;
        let horizon = self.calendar.last_month_index();
        let forecast = self.forecast.forecast(&record.sku, horizon);
        allocate_sku(
            record,
            &profile,
            &self.config,
            &self.calendar,
            forecast.as_deref(),
        )
    }

    /// 批量处理
    ///
    /// - 校验失败 → 跳过, 计入 skipped
    /// - 守恒失败 → 记录错误, 计入 failed
    /// - SKU 重复 → 仅保留首条, 其余按校验失败跳过
    #[instrument(skip(self, records), fields(count = records.len(), as_of = %self.config.as_of))]
    pub fn run(&self, records: &[SkuRecord]) -> RunOutput {
        let mut summary = RunSummary::new(self.config.as_of);
        let mut results = Vec::with_capacity(records.len());
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        info!(run_id = %summary.run_id, "开始消耗分析");

        for record in records {
            summary.total += 1;

            if !record.sku.trim().is_empty() && !seen.insert(record.sku.clone()) {
                let err = EngineError::validation(&record.sku, "sku", "同批次内 SKU 重复");
                warn!(error = %err, "记录跳过");
                summary.skipped += 1;
                errors.push(err);
                continue;
            }

            match self.process(record) {
                Ok(result) => {
                    debug!(
                        sku = %result.sku,
                        category = %result.category,
                        horizon = %result.horizon,
                        "SKU 分配完成"
                    );
                    summary.record_result(&result);
                    results.push(result);
                }
                Err(err @ EngineError::Validation { .. }) => {
                    warn!(error = %err, "记录跳过");
                    summary.skipped += 1;
                    errors.push(err);
                }
                Err(err) => {
                    error!(error = %err, "SKU 处理失败");
                    summary.failed += 1;
                    errors.push(err);
                }
            }
        }

        info!(
            total = summary.total,
            processed = summary.processed,
            skipped = summary.skipped,
            flagged = summary.flagged,
            failed = summary.failed,
            "消耗分析完成"
        );

        RunOutput {
            results,
            errors,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{BurnDownHorizon, Category};
    use chrono::NaiveDate;

    fn config() -> EngineConfig {
        EngineConfig::with_as_of(NaiveDate::from_ymd_opt(2026, 5, 4).unwrap())
    }

    fn record(sku: &str, on_hand: Decimal) -> SkuRecord {
        let mut rec = SkuRecord::new(sku, on_hand);
        rec.usage_history = vec![dec!(4); 12];
        rec.poc = Some(dec!(100));
        rec.lead_time_days = 30;
        rec
    }

    #[test]
    fn test_validate_record() {
        assert!(validate_record(&record("S1", dec!(1))).is_ok());
        assert!(validate_record(&record(" ", dec!(1))).is_err());
        assert!(validate_record(&record("S1", dec!(-1))).is_err());

        let mut bad_poc = record("S1", dec!(1));
        bad_poc.poc = Some(dec!(120));
        assert!(validate_record(&bad_poc).is_err());
    }

    #[test]
    fn test_validate_unit_cost() {
        let mut rec = record("S1", dec!(10));
        rec.unit_cost = Some(dec!(2.5));
        assert!(validate_record(&rec).is_ok());

        rec.unit_cost = Some(dec!(-1));
        assert!(matches!(
            validate_record(&rec),
            Err(EngineError::Validation { ref field, .. }) if field == "unit_cost"
        ));

        rec.on_hand = Decimal::MAX;
        rec.unit_cost = Some(dec!(2));
        assert!(validate_record(&rec).is_err());
    }

    #[test]
    fn test_classify_and_allocate_conserves() {
        let config = config();
        let rec = record("S1", dec!(37));
        let profile = UsageCalculator::from_config(&config).compute(&rec).unwrap();
        let result = classify_and_allocate(&rec, &profile, &config).unwrap();

        assert_eq!(result.total_allocated(), dec!(37));
        assert_eq!(result.quantity_for(Category::SafetyStock), dec!(4));
        assert_eq!(result.excess_qty(), dec!(33));
        // 超额 33 按每月 4 消耗: 桶 1..=8 各 4, 桶 9 余 1
        assert_eq!(result.horizon, BurnDownHorizon::SixToTwelveMonths);
        assert_eq!(result.rule_id, "DEFAULT");
    }

    #[test]
    fn test_engine_rejects_bad_config() {
        let mut config = config();
        config.safety_multiplier = dec!(-1);
        assert!(BurnDownEngine::new(config).is_err());
    }

    #[test]
    fn test_run_isolates_bad_records() {
        crate::logging::init_test();
        let engine = BurnDownEngine::new(config()).unwrap();
        let records = vec![
            record("S1", dec!(10)),
            record("", dec!(10)),
            record("S1", dec!(10)),
            record("S2", dec!(-3)),
            record("S3", dec!(10)),
        ];
        let output = engine.run(&records);

        assert_eq!(output.results.len(), 2);
        assert_eq!(output.summary.total, 5);
        assert_eq!(output.summary.processed, 2);
        assert_eq!(output.summary.skipped, 3);
        assert_eq!(output.summary.failed, 0);
        assert!(output.summary.is_balanced());
        assert_eq!(output.errors.len(), 3);
    }

    #[test]
    fn test_forecast_provider_changes_burn_rate() {
        use crate::engine::forecast::StaticForecast;

        let mut provider = StaticForecast::new();
        // 中位数 4: 预测 2 不被封顶
        provider.insert("S1", vec![dec!(2); 24]);
        let engine = BurnDownEngine::new(config())
            .unwrap()
            .with_forecast_provider(Box::new(provider));

        let result = engine.process(&record("S1", dec!(24))).unwrap();
        // 安全库存 4, 超额 20 按每月 2 消耗 → 10 个月
        assert_eq!(result.quantity_for(Category::SafetyStock), dec!(4));
        let last_bucket = result.entries.iter().map(|e| e.bucket_index).max().unwrap();
        assert_eq!(last_bucket, 10);
        assert_eq!(result.horizon, BurnDownHorizon::SixToTwelveMonths);
    }

    #[test]
    fn test_overflowing_record_is_skipped() {
        let engine = BurnDownEngine::new(config()).unwrap();
        let mut huge = record("S2", dec!(10));
        huge.usage_history = vec![Decimal::MAX];
        huge.lead_time_days = 60;

        let output = engine.run(&[record("S1", dec!(10)), huge]);

        assert_eq!(output.summary.processed, 1);
        assert_eq!(output.summary.skipped, 1);
        assert!(output.summary.is_balanced());
        assert!(matches!(output.errors[0], EngineError::Validation { ref sku, .. } if sku == "S2"));
    }
}
