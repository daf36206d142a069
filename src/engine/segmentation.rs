// ==========================================
// 库存消耗分析系统 - 需求模式分段
// ==========================================
// 职责: 根据回看窗口内的用量命中情况划分需求模式
// 输入: 窗口用量序列（由旧到新）
// 输出: DemandPattern + 分段统计量
// ==========================================

use crate::domain::types::DemandPattern;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// 连续需求命中率阈值
pub const CONTINUOUS_HIT_RATIO: f64 = 0.80;
/// 少于该命中月数视为买断类
pub const MIN_HITS: usize = 4;
/// 窗口总量低于该值视为一次性买断
pub const MIN_TOTAL_QTY: Decimal = dec!(10);
/// 峰值/中位数比值上限（季节性）
pub const SPIKE_RATIO: Decimal = dec!(3);

/// 分段统计量
#[derive(Debug, Clone, PartialEq)]
pub struct PatternStats {
    pub hits: usize,
    pub periods: usize,
    pub total: Decimal,
    pub max: Decimal,
    /// 非零月份中位数
    pub median_nonzero: Decimal,
    /// 最长连续非零月数
    pub max_run: usize,
    /// 最近 3 个月均非零
    pub last3_nonzero: bool,
}

impl PatternStats {
    pub fn from_window(window: &[Decimal]) -> Self {
        let nonzero: Vec<Decimal> = window.iter().copied().filter(|q| *q > Decimal::ZERO).collect();

        let mut max_run = 0;
        let mut run = 0;
        for q in window {
            if *q > Decimal::ZERO {
                run += 1;
                max_run = max_run.max(run);
            } else {
                run = 0;
            }
        }

        let last3_nonzero =
            window.len() >= 3 && window[window.len() - 3..].iter().all(|q| *q > Decimal::ZERO);

        Self {
            hits: nonzero.len(),
            periods: window.len(),
            total: window
                .iter()
                .fold(Decimal::ZERO, |acc, q| acc.saturating_add(*q)),
            max: window.iter().copied().max().unwrap_or(Decimal::ZERO),
            median_nonzero: median(&nonzero),
            max_run,
            last3_nonzero,
        }
    }

    pub fn hit_ratio(&self) -> f64 {
        if self.periods == 0 {
            return 0.0;
        }
        self.hits as f64 / self.periods as f64
    }

    /// 峰值/非零中位数比
    fn peak_ratio(&self) -> Decimal {
        if self.median_nonzero.is_zero() {
            return Decimal::ZERO;
        }
        self.max / self.median_nonzero
    }
}

/// 判定需求模式
///
/// 规则（顺序执行，命中即返回）:
/// 1) hits ≤ 2 或 窗口总量 < 10 → True Buy-Out
/// 2) hits < 4 且 最近 3 个月均有用量 → Emerging Buy-Out
/// 3) 命中率 ≥ 80% → High Run-Rate
/// 4) 4 ≤ hits ≤ 9 且 峰值/中位数 ≤ 3 且 最长连续 ≤ 3 → Seasonal Buy-Out
/// 5) 1 ≤ hits ≤ 3 且 峰值/中位数 > 3 → Spike-Driven Buy-Out
/// 6) 其他 → Intermittent Buy-Out
pub fn classify_pattern(stats: &PatternStats) -> DemandPattern {
    // 规则1: 一次性买断
    if stats.hits <= 2 || stats.total < MIN_TOTAL_QTY {
        return DemandPattern::TrueBuyOut;
    }

    // 规则2: 新兴需求
    if stats.hits < MIN_HITS && stats.last3_nonzero {
        return DemandPattern::EmergingBuyOut;
    }

    // 规则3: 高频连续
    if stats.hit_ratio() >= CONTINUOUS_HIT_RATIO {
        return DemandPattern::HighRunRate;
    }

    let peak = stats.peak_ratio();

    // 规则4: 季节性
    if (4..=9).contains(&stats.hits) && peak <= SPIKE_RATIO && stats.max_run <= 3 {
        return DemandPattern::SeasonalBuyOut;
    }

    // 规则5: 尖峰驱动
    if (1..=3).contains(&stats.hits) && peak > SPIKE_RATIO {
        return DemandPattern::SpikeDrivenBuyOut;
    }

    // 规则6: 间歇性（默认）
    DemandPattern::IntermittentBuyOut
}

/// 中位数（偶数个取中间两数均值; 空序列为 0）
pub fn median(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    let mut sorted = values.to_vec();
    sorted.sort();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        let (lo, hi) = (sorted[mid - 1], sorted[mid]);
        match lo.checked_add(hi) {
            Some(sum) => sum / dec!(2),
            None => lo / dec!(2) + hi / dec!(2),
        }
    } else {
        sorted[mid]
    }
}
