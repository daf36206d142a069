// ==========================================
// 库存消耗分析系统 - 消耗区间判定
// ==========================================
// 职责: 由分配三元组判定单 SKU 的消耗区间标签
// 规则（顺序执行，命中即返回）:
// 1) 零用量 SKU → Never（零预测保持为零）
// 2) 在库为 0 → No Inventory
// 3) 除安全库存外无分配 → No Excess
// 4) 任一非安全库存数量落入终端桶 → Never
// 5) 按时间顺序累加非安全库存数量, 累计达到合计的桶 → 对应月份区间
// ==========================================

use crate::domain::allocation::{AllocationEntry, BucketCalendar};
use crate::domain::types::{BurnDownHorizon, Category};
use crate::engine::error::{EngineError, EngineResult};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[derive(Debug, Default, Clone)]
pub struct BurnDownCategorizer;

impl BurnDownCategorizer {
    pub fn new() -> Self {
        Self
    }

    /// 判定消耗区间
    ///
    /// entries 需按桶索引升序（分配器输出已满足）
    pub fn categorize(
        &self,
        entries: &[AllocationEntry],
        on_hand: Decimal,
        zero_usage: bool,
        calendar: &BucketCalendar,
    ) -> BurnDownHorizon {
        // 规则1: 零用量
        if zero_usage {
            return BurnDownHorizon::Never;
        }

        // 规则2: 无库存
        if on_hand <= Decimal::ZERO {
            return BurnDownHorizon::NoInventory;
        }

        let tracked: Vec<&AllocationEntry> = entries
            .iter()
            .filter(|e| e.category != Category::SafetyStock && e.quantity > Decimal::ZERO)
            .collect();

        // 规则3: 仅安全库存
        let total: Decimal = tracked.iter().map(|e| e.quantity).sum();
        if total.is_zero() {
            return BurnDownHorizon::NoExcess;
        }

        // 规则4: 终端桶
        let never = calendar.never_index();
        if tracked.iter().any(|e| e.bucket_index >= never) {
            return BurnDownHorizon::Never;
        }

        // 规则5: 累计消耗到零的桶
        let mut sorted = tracked;
        sorted.sort_by_key(|e| e.bucket_index);

        let mut cumulative = Decimal::ZERO;
        for entry in sorted {
            cumulative += entry.quantity;
            if cumulative >= total {
                return BurnDownHorizon::from_month_index(entry.bucket_index);
            }
        }

        // 累加与合计一致时不会到达
        BurnDownHorizon::Never
    }

    /// 消耗年数 = 超额 / (月均用量 × 12); 零用量返回 None
    ///
    /// 年用量或商超出 Decimal 范围时返回校验错误
    pub fn burn_down_years(
        &self,
        sku: &str,
        excess: Decimal,
        average_monthly: Decimal,
    ) -> EngineResult<Option<Decimal>> {
        if average_monthly <= Decimal::ZERO {
            return Ok(None);
        }
        average_monthly
            .checked_mul(dec!(12))
            .and_then(|annual| excess.checked_div(annual))
            .map(|years| Some(years.round_dp(4)))
            .ok_or_else(|| {
                EngineError::validation(
                    sku,
                    "usage_history",
                    format!("消耗年数溢出: 超额 {} / 月均 {}", excess, average_monthly),
                )
            })
    }
}
