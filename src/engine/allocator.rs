// ==========================================
// 库存消耗分析系统 - 时间桶分配器
// ==========================================
// 职责: 将单 SKU 在库数量按类别分配到有序时间桶
// 红线: 守恒: 分配合计 == 在库数量; 任何数量不得为负
// ==========================================
// 算法（贪心, 自左向右）:
// 1) min(在库, 安全库存) → 桶 0 / Safety Stock
// 2) min(剩余, 未结需求) → 交期所在桶 / Open Demand Coverage
//    同桶内按开单日期升序（早者优先）, 再按工单号
// 3) 剩余超额 → 分类类别, 自桶 1 起按逐月消耗速率分摊,
//    跳过已有需求覆盖的桶; 展望期后剩余 → Never
// 4) 零用量 SKU → 超额整体进入 Never
// ==========================================

use crate::domain::allocation::{AllocationEntry, BucketCalendar};
use crate::domain::sku::{DemandLine, SkuRecord};
use crate::domain::types::Category;
use crate::domain::usage::UsageProfile;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use tracing::trace;

/// 消耗速率定标位数（保证逐桶加减精确, 守恒可精确校验）
pub const RATE_SCALE: u32 = 8;

// ==========================================
// TimeBucketAllocator - 时间桶分配器
// ==========================================
#[derive(Debug, Default, Clone)]
pub struct TimeBucketAllocator;

impl TimeBucketAllocator {
    pub fn new() -> Self {
        Self
    }

    /// 分配单个 SKU
    ///
    /// # 参数
    /// - record: SKU 快照
    /// - profile: 用量画像（提供安全库存）
    /// - excess_category: 分类引擎判定的超额类别
    /// - rates: 桶 1..=H 的逐月消耗速率（长度不足按 0 处理）
    /// - calendar: 桶序列
    ///
    /// # 返回
    /// 按 (桶, 类别) 排序的分配三元组, 同一 (桶, 类别) 已合并
    pub fn allocate(
        &self,
        record: &SkuRecord,
        profile: &UsageProfile,
        excess_category: Category,
        rates: &[Decimal],
        calendar: &BucketCalendar,
    ) -> Vec<AllocationEntry> {
        let mut ledger: BTreeMap<(usize, Category), Decimal> = BTreeMap::new();
        let mut remaining = record.on_hand.max(Decimal::ZERO);

        // === 步骤 1: 安全库存 → 最早桶 ===
        let safety = profile
            .safety_stock
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO)
            .min(remaining);
        if safety > Decimal::ZERO {
            *ledger.entry((0, Category::SafetyStock)).or_insert(Decimal::ZERO) += safety;
            remaining -= safety;
        }

        // === 步骤 2: 未结需求 → 交期所在桶 ===
        let mut demand_buckets = BTreeSet::new();
        for (bucket, line) in ordered_demand(&record.demands, calendar) {
            if remaining.is_zero() {
                break;
            }
            let qty = line.quantity.max(Decimal::ZERO).min(remaining);
            if qty.is_zero() {
                continue;
            }
            *ledger
                .entry((bucket, Category::OpenDemandCoverage))
                .or_insert(Decimal::ZERO) += qty;
            demand_buckets.insert(bucket);
            remaining -= qty;
        }

        // === 步骤 3/4: 超额按消耗速率分摊 ===
        if remaining > Decimal::ZERO {
            let zero_usage =
                profile.is_zero_usage() || rates.iter().all(|r| *r <= Decimal::ZERO);

            if !zero_usage {
                for bucket in 1..=calendar.last_month_index() {
                    if remaining.is_zero() {
                        break;
                    }
                    if demand_buckets.contains(&bucket) {
                        continue;
                    }
                    let rate = rates
                        .get(bucket - 1)
                        .copied()
                        .unwrap_or(Decimal::ZERO)
                        .round_dp(RATE_SCALE);
                    if rate <= Decimal::ZERO {
                        continue;
                    }
                    let qty = rate.min(remaining);
                    *ledger.entry((bucket, excess_category)).or_insert(Decimal::ZERO) += qty;
                    remaining -= qty;
                }
            }

            if remaining > Decimal::ZERO {
                trace!(sku = %record.sku, remaining = %remaining, zero_usage, "超额进入 Never 桶");
                *ledger
                    .entry((calendar.never_index(), excess_category))
                    .or_insert(Decimal::ZERO) += remaining;
            }
        }

        ledger
            .into_iter()
            .map(|((bucket_index, category), quantity)| AllocationEntry {
                bucket_index,
                category,
                quantity,
            })
            .collect()
    }
}

/// 需求行排序: 交期桶升序 → 开单日期升序（缺失排后）→ 工单号
fn ordered_demand<'a>(
    demands: &'a [DemandLine],
    calendar: &BucketCalendar,
) -> Vec<(usize, &'a DemandLine)> {
    let mut lines: Vec<(usize, &DemandLine)> = demands
        .iter()
        .map(|d| (calendar.bucket_for_due_date(d.due_date), d))
        .collect();

    lines.sort_by(|(ba, a), (bb, b)| {
        ba.cmp(bb)
            .then_with(|| match (a.opened_on, b.opened_on) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
            .then_with(|| a.order_id.cmp(&b.order_id))
    });
    lines
}
