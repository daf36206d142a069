// ==========================================
// 库存消耗分析系统 - 预测接入与覆写
// ==========================================
// 职责: 接收外部预测序列, 按需求模式覆写/封顶, 生成逐月消耗速率
// 红线: 不做模型拟合; 零用量 SKU 的消耗速率恒为零
// ==========================================

use crate::domain::types::DemandPattern;
use crate::domain::usage::UsageProfile;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

/// 低于该值的预测视为零
const MIN_FORECAST_QTY: Decimal = dec!(1);

// ==========================================
// ForecastProvider Trait
// ==========================================
// 用途: 外部预测服务接口（按 SKU 返回逐月预测, 自基准月起）
// 实现者: NoForecast, StaticForecast
pub trait ForecastProvider: Send + Sync {
    /// 返回至多 horizon 个月的预测; None 表示无预测
    fn forecast(&self, sku: &str, horizon: usize) -> Option<Vec<Decimal>>;
}

/// 不提供预测（按历史均值消耗）
#[derive(Debug, Default, Clone)]
pub struct NoForecast;

impl ForecastProvider for NoForecast {
    fn forecast(&self, _sku: &str, _horizon: usize) -> Option<Vec<Decimal>> {
        None
    }
}

/// 内存预测表（预测结果已由外部落地为表格时使用）
#[derive(Debug, Default, Clone)]
pub struct StaticForecast {
    series: HashMap<String, Vec<Decimal>>,
}

impl StaticForecast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sku: impl Into<String>, series: Vec<Decimal>) {
        self.series.insert(sku.into(), series);
    }
}

impl ForecastProvider for StaticForecast {
    fn forecast(&self, sku: &str, horizon: usize) -> Option<Vec<Decimal>> {
        self.series
            .get(sku)
            .map(|s| s.iter().take(horizon).copied().collect())
    }
}

/// 预测覆写
///
/// 规则:
/// 1) True Buy-Out / Emerging Buy-Out → 全部归零
/// 2) Seasonal Buy-Out → 以中位数替代预测
/// 3) 其他 → min(预测, capv × 系数, 中位数 × 系数),
///    capv 对 Spike-Driven Buy-Out 为 2 × 中位数, 其余为中位数
/// 4) 覆写后 < 1 → 0
pub fn adjust_forecast(
    pattern: DemandPattern,
    series: &[Decimal],
    median: Decimal,
    cap_multiplier: Decimal,
) -> Vec<Decimal> {
    if pattern.forces_zero_forecast() {
        return vec![Decimal::ZERO; series.len()];
    }

    if pattern == DemandPattern::SeasonalBuyOut {
        return series.iter().map(|_| floor_small(median)).collect();
    }

    let capv = match pattern {
        DemandPattern::SpikeDrivenBuyOut => median.checked_mul(dec!(2)),
        _ => Some(median),
    };
    // 溢出的上限不可能被超过, 视为不封顶
    let caps: Vec<Decimal> = [capv, Some(median)]
        .into_iter()
        .flatten()
        .filter_map(|c| c.checked_mul(cap_multiplier))
        .collect();

    series
        .iter()
        .map(|q| {
            let base = (*q).max(Decimal::ZERO);
            floor_small(caps.iter().fold(base, |acc, c| acc.min(*c)))
        })
        .collect()
}

/// 去年同月封顶
///
/// 第 k 个展望月（自基准月起, 0 起）对应历史中 len - 12 + (k % 12) 位置的月份,
/// 即截至基准月的最近 12 个月中同一日历月; 历史不足 12 个月时不封顶。
pub fn cap_to_last_year(rates: &mut [Decimal], history: &[Decimal], cap_multiplier: Decimal) {
    if history.len() < 12 {
        return;
    }
    let year_start = history.len() - 12;
    for (k, rate) in rates.iter_mut().enumerate() {
        let same_month = history[year_start + k % 12];
        if let Some(cap) = same_month.checked_mul(cap_multiplier) {
            *rate = floor_small((*rate).min(cap.max(Decimal::ZERO)));
        }
    }
}

fn floor_small(q: Decimal) -> Decimal {
    if q < MIN_FORECAST_QTY {
        Decimal::ZERO
    } else {
        q
    }
}

/// 生成展望期内逐月消耗速率（长度 = horizon）
///
/// - 零用量 SKU → 全零（零预测保持为零）
/// - 有预测 → 覆写并按去年同月封顶后的预测, 不足部分以历史均值补齐
/// - 无预测 → 历史均值
pub fn burn_rates(
    profile: &UsageProfile,
    history: &[Decimal],
    forecast: Option<&[Decimal]>,
    horizon: usize,
    cap_multiplier: Decimal,
) -> Vec<Decimal> {
    if profile.is_zero_usage() {
        return vec![Decimal::ZERO; horizon];
    }

    match (forecast, profile.pattern) {
        (Some(series), Some(pattern)) if !series.is_empty() => {
            let mut rates = adjust_forecast(pattern, series, profile.median, cap_multiplier);
            rates.truncate(horizon);
            cap_to_last_year(&mut rates, history, cap_multiplier);
            while rates.len() < horizon {
                rates.push(profile.average);
            }
            rates
        }
        _ => vec![profile.average; horizon],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(average: Decimal, median: Decimal, pattern: DemandPattern) -> UsageProfile {
        UsageProfile {
            window_len: 12,
            median,
            average,
            max_month: median,
            volatility: 0.0,
            safety_stock: Some(Decimal::ZERO),
            pattern: Some(pattern),
            low_confidence: false,
            flags: Vec::new(),
        }
    }

    #[test]
    fn test_buy_out_forecast_zeroed() {
        let adjusted = adjust_forecast(DemandPattern::TrueBuyOut, &[dec!(5), dec!(7)], dec!(5), dec!(1));
        assert_eq!(adjusted, vec![Decimal::ZERO, Decimal::ZERO]);
    }

    #[test]
    fn test_forecast_capped_at_median() {
        let adjusted = adjust_forecast(
            DemandPattern::HighRunRate,
            &[dec!(15), dec!(8), dec!(0.4)],
            dec!(10),
            dec!(1),
        );
        assert_eq!(adjusted, vec![dec!(10), dec!(8), Decimal::ZERO]);
    }

    #[test]
    fn test_spike_capped_by_median_term() {
        // min(50, 2×10×1.5, 10×1.5) = 15
        let adjusted = adjust_forecast(DemandPattern::SpikeDrivenBuyOut, &[dec!(50), dec!(12)], dec!(10), dec!(1.5));
        assert_eq!(adjusted, vec![dec!(15), dec!(12)]);
    }

    #[test]
    fn test_seasonal_uses_median() {
        let adjusted = adjust_forecast(DemandPattern::SeasonalBuyOut, &[dec!(50)], dec!(10), dec!(1));
        assert_eq!(adjusted, vec![dec!(10)]);

        let adjusted = adjust_forecast(DemandPattern::SeasonalBuyOut, &[dec!(0), dec!(3)], dec!(10), dec!(1));
        assert_eq!(adjusted, vec![dec!(10), dec!(10)]);
    }

    #[test]
    fn test_cap_overflow_means_uncapped() {
        let adjusted = adjust_forecast(DemandPattern::SpikeDrivenBuyOut, &[dec!(50)], Decimal::MAX, dec!(1));
        assert_eq!(adjusted, vec![dec!(50)]);
    }

    #[test]
    fn test_last_year_same_month_cap() {
        // 历史: 去年 5 月..今年 4 月, 基准月为 5 月
        let history: Vec<Decimal> = (1..=12).map(Decimal::from).collect();
        let mut rates = vec![dec!(5); 14];
        cap_to_last_year(&mut rates, &history, dec!(1));

        // 5 月 → 去年 5 月 = 1; 6 月 → 2; 第 13 个月回到 5 月
        assert_eq!(rates[0], dec!(1));
        assert_eq!(rates[1], dec!(2));
        assert_eq!(rates[4], dec!(5));
        assert_eq!(rates[11], dec!(5));
        assert_eq!(rates[12], dec!(1));
        assert_eq!(rates[13], dec!(2));
    }

    #[test]
    fn test_last_year_cap_needs_full_year() {
        let mut rates = vec![dec!(5); 3];
        cap_to_last_year(&mut rates, &[dec!(0); 6], dec!(1));
        assert_eq!(rates, vec![dec!(5); 3]);
    }

    #[test]
    fn test_burn_rates_apply_last_year_cap() {
        let p = profile(dec!(10), dec!(10), DemandPattern::HighRunRate);
        let mut history = vec![dec!(10); 12];
        history[0] = dec!(0.5);
        let rates = burn_rates(&p, &history, Some(&[dec!(8), dec!(8)]), 3, dec!(1));
        // 第一个月去年同月为 0.5 → 归零; 缺失部分以均值补齐
        assert_eq!(rates, vec![Decimal::ZERO, dec!(8), dec!(10)]);
    }

    #[test]
    fn test_burn_rates_flat_without_forecast() {
        let p = profile(dec!(10), dec!(10), DemandPattern::HighRunRate);
        assert_eq!(burn_rates(&p, &[], None, 3, dec!(1)), vec![dec!(10); 3]);
    }

    #[test]
    fn test_burn_rates_padded_forecast() {
        let p = profile(dec!(10), dec!(10), DemandPattern::HighRunRate);
        let rates = burn_rates(&p, &[], Some(&[dec!(6)]), 3, dec!(1));
        assert_eq!(rates, vec![dec!(6), dec!(10), dec!(10)]);
    }

    #[test]
    fn test_zero_usage_ignores_forecast() {
        let p = profile(Decimal::ZERO, Decimal::ZERO, DemandPattern::HighRunRate);
        let rates = burn_rates(&p, &[dec!(0); 12], Some(&[dec!(6), dec!(6)]), 2, dec!(1));
        assert_eq!(rates, vec![Decimal::ZERO; 2]);
    }

    #[test]
    fn test_static_forecast_truncates() {
        let mut provider = StaticForecast::new();
        provider.insert("S1", vec![dec!(1), dec!(2), dec!(3)]);
        assert_eq!(provider.forecast("S1", 2), Some(vec![dec!(1), dec!(2)]));
        assert_eq!(provider.forecast("S2", 2), None);
    }
}
