// ==========================================
// 库存消耗分析系统 - 用量与安全库存计算器
// ==========================================
// 职责: 由历史用量计算用量画像（中位数/均值/波动/安全库存/需求模式）
// 输入: SkuRecord.usage_history + lead_time_days
// 输出: UsageProfile（一次计算, 下游只读）
// ==========================================

use crate::config::EngineConfig;
use crate::domain::sku::SkuRecord;
use crate::domain::types::{DemandPattern, DqFlag};
use crate::domain::usage::UsageProfile;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::segmentation::{classify_pattern, median, PatternStats};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// 提前期换算: 每月天数
pub const DAYS_PER_MONTH: u32 = 30;

// ==========================================
// UsageCalculator - 用量与安全库存计算器
// ==========================================
#[derive(Debug, Clone)]
pub struct UsageCalculator {
    lookback_months: usize,
    safety_multiplier: Decimal,
}

impl UsageCalculator {
    pub fn new(lookback_months: u32, safety_multiplier: Decimal) -> Self {
        Self {
            lookback_months: lookback_months as usize,
            safety_multiplier,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.lookback_months, config.safety_multiplier)
    }

    /// 计算用量画像
    ///
    /// 边界处理:
    /// - 无历史用量 → 画像未定义（安全库存 None）, 标记 NO_USAGE_HISTORY
    /// - 历史不足回看窗口 → 使用全部可用月份, 标记低置信度
    /// - 窗口均值为零 → 波动系数取 0, 标记 INTERMITTENT
    /// - 合计或安全库存超出 Decimal 表示范围 → 校验失败
    pub fn compute(&self, record: &SkuRecord) -> EngineResult<UsageProfile> {
        if record.usage_history.is_empty() {
            return Ok(UsageProfile::undefined());
        }

        let window = record.trailing_usage(self.lookback_months);
        let mut flags = Vec::new();

        let low_confidence = window.len() < self.lookback_months;
        if low_confidence {
            flags.push(DqFlag::ShortUsageHistory);
        }

        let median_qty = median(window);
        let total = window
            .iter()
            .try_fold(Decimal::ZERO, |acc, q| acc.checked_add(*q))
            .ok_or_else(|| EngineError::validation(&record.sku, "usage_history", "用量合计溢出"))?;
        let average = total / Decimal::from(window.len());
        let max_month = window.iter().copied().max().unwrap_or(Decimal::ZERO);

        let volatility = if average.is_zero() {
            flags.push(DqFlag::Intermittent);
            0.0
        } else {
            coefficient_of_variation(window, average)
        };

        let stats = PatternStats::from_window(window);
        let pattern = classify_pattern(&stats);

        let safety_stock = self
            .safety_stock(median_qty, record.lead_time_days, pattern, max_month)
            .ok_or_else(|| {
                EngineError::validation(
                    &record.sku,
                    "lead_time_days",
                    format!(
                        "安全库存溢出: 中位数 {} × 提前期 {} 天",
                        median_qty, record.lead_time_days
                    ),
                )
            })?;

        Ok(UsageProfile {
            window_len: window.len(),
            median: median_qty,
            average,
            max_month,
            volatility,
            safety_stock: Some(safety_stock),
            pattern: Some(pattern),
            low_confidence,
            flags,
        })
    }

    /// 安全库存 = 中位数 × ceil(提前期天数 / 30) × 系数
    ///
    /// True Buy-Out 封顶为窗口内最大单月用量; 乘积溢出返回 None
    pub fn safety_stock(
        &self,
        median_qty: Decimal,
        lead_time_days: u32,
        pattern: DemandPattern,
        max_month: Decimal,
    ) -> Option<Decimal> {
        let lead_months = Decimal::from(lead_time_months(lead_time_days));
        let raw = median_qty
            .checked_mul(lead_months)?
            .checked_mul(self.safety_multiplier)?;

        if pattern == DemandPattern::TrueBuyOut {
            Some(raw.min(max_month))
        } else {
            Some(raw)
        }
    }
}

/// 提前期（月, 向上取整）
pub fn lead_time_months(lead_time_days: u32) -> u32 {
    lead_time_days.div_ceil(DAYS_PER_MONTH)
}

/// 总体标准差 / 均值
fn coefficient_of_variation(window: &[Decimal], average: Decimal) -> f64 {
    let mean = average.to_f64().unwrap_or(0.0);
    if mean == 0.0 {
        return 0.0;
    }
    let n = window.len() as f64;
    let variance = window
        .iter()
        .map(|q| {
            let d = q.to_f64().unwrap_or(0.0) - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    variance.sqrt() / mean
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record_with_usage(values: &[i64], lead_time_days: u32) -> SkuRecord {
        let mut rec = SkuRecord::new("S1", dec!(100));
        rec.usage_history = values.iter().map(|v| Decimal::from(*v)).collect();
        rec.lead_time_days = lead_time_days;
        rec
    }

    #[test]
    fn test_lead_time_months_rounds_up() {
        assert_eq!(lead_time_months(0), 0);
        assert_eq!(lead_time_months(1), 1);
        assert_eq!(lead_time_months(30), 1);
        assert_eq!(lead_time_months(31), 2);
        assert_eq!(lead_time_months(60), 2);
    }

    #[test]
    fn test_steady_usage_profile() {
        let calc = UsageCalculator::new(12, dec!(1.0));
        let profile = calc.compute(&record_with_usage(&[10; 12], 60)).unwrap();

        assert_eq!(profile.median, dec!(10));
        assert_eq!(profile.average, dec!(10));
        assert_eq!(profile.volatility, 0.0);
        assert_eq!(profile.safety_stock, Some(dec!(20)));
        assert_eq!(profile.pattern, Some(DemandPattern::HighRunRate));
        assert!(!profile.low_confidence);
        assert!(profile.flags.is_empty());
    }

    #[test]
    fn test_only_trailing_window_used() {
        let calc = UsageCalculator::new(12, dec!(1.0));
        let mut values = vec![1000; 6];
        values.extend_from_slice(&[10; 12]);
        let profile = calc.compute(&record_with_usage(&values, 30)).unwrap();
        assert_eq!(profile.window_len, 12);
        assert_eq!(profile.median, dec!(10));
    }

    #[test]
    fn test_multiplier_applied() {
        let calc = UsageCalculator::new(12, dec!(1.5));
        let profile = calc.compute(&record_with_usage(&[10; 12], 45)).unwrap();
        assert_eq!(profile.safety_stock, Some(dec!(30)));
    }

    #[test]
    fn test_zero_usage_is_intermittent() {
        let calc = UsageCalculator::new(12, dec!(1.0));
        let profile = calc.compute(&record_with_usage(&[0; 12], 90)).unwrap();
        assert_eq!(profile.volatility, 0.0);
        assert_eq!(profile.safety_stock, Some(Decimal::ZERO));
        assert!(profile.is_zero_usage());
        assert!(profile.flags.contains(&DqFlag::Intermittent));
    }

    #[test]
    fn test_short_history_low_confidence() {
        let calc = UsageCalculator::new(12, dec!(1.0));
        let profile = calc.compute(&record_with_usage(&[4, 6, 8], 30)).unwrap();
        assert_eq!(profile.window_len, 3);
        assert_eq!(profile.median, dec!(6));
        assert!(profile.low_confidence);
        assert!(profile.flags.contains(&DqFlag::ShortUsageHistory));
    }

    #[test]
    fn test_empty_history_undefined() {
        let calc = UsageCalculator::new(12, dec!(1.0));
        let profile = calc.compute(&record_with_usage(&[], 30)).unwrap();
        assert!(!profile.is_defined());
        assert!(profile.flags.contains(&DqFlag::NoUsageHistory));
    }

    #[test]
    fn test_true_buy_out_capped_at_max_month() {
        let calc = UsageCalculator::new(12, dec!(1.0));
        // 两次命中: 中位数 0, 安全库存 0
        let profile = calc.compute(&record_with_usage(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 8, 8], 300)).unwrap();
        assert_eq!(profile.pattern, Some(DemandPattern::TrueBuyOut));
        assert_eq!(profile.safety_stock, Some(Decimal::ZERO));

        let cap = calc.safety_stock(dec!(8), 300, DemandPattern::TrueBuyOut, dec!(8));
        assert_eq!(cap, Some(dec!(8)));
    }

    #[test]
    fn test_volatility() {
        let calc = UsageCalculator::new(4, dec!(1.0));
        let profile = calc.compute(&record_with_usage(&[5, 15, 5, 15], 30)).unwrap();
        // mean 10, std 5
        assert!((profile.volatility - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_overflowing_usage_is_validation_error() {
        let calc = UsageCalculator::new(12, dec!(1.0));

        let mut rec = record_with_usage(&[], 30);
        rec.usage_history = vec![Decimal::MAX, Decimal::MAX];
        let err = calc.compute(&rec).unwrap_err();
        assert!(matches!(err, EngineError::Validation { ref field, .. } if field == "usage_history"));
        assert!(!err.is_fatal());

        // 单月接近上限, 乘以 2 个月提前期溢出
        rec.usage_history = vec![Decimal::MAX];
        rec.lead_time_days = 60;
        let err = calc.compute(&rec).unwrap_err();
        assert!(matches!(err, EngineError::Validation { ref field, .. } if field == "lead_time_days"));
    }
}
