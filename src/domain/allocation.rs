// ==========================================
// 库存消耗分析系统 - 分桶与分配结果
// ==========================================
// 职责: 定义时间桶序列（逾期桶 + 月度桶 + 终端桶）与单 SKU 分配结果
// 红线: 守恒: 单 SKU 全部桶/类别数量之和 == 在库数量
// ==========================================

use crate::domain::types::{BurnDownHorizon, Category, DemandPattern, DqFlag};
use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Bucket - 时间桶
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BucketKind {
    PastDue,
    Month,
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub index: usize,
    pub label: String,
    pub kind: BucketKind,
    /// 月度桶的月初日期
    pub month_start: Option<NaiveDate>,
}

pub const PAST_DUE_LABEL: &str = "Past Due";
pub const NEVER_LABEL: &str = "Never";

// ==========================================
// BucketCalendar - 单次运行的桶序列
// ==========================================
// 索引 0 = 逾期桶; 1..=H = 自基准月起的连续月份; H+1 = Never
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketCalendar {
    pub as_of: NaiveDate,
    pub horizon_months: u32,
    buckets: Vec<Bucket>,
}

impl BucketCalendar {
    pub fn new(as_of: NaiveDate, horizon_months: u32) -> Self {
        let first_month = first_of_month(as_of);
        let mut buckets = Vec::with_capacity(horizon_months as usize + 2);

        buckets.push(Bucket {
            index: 0,
            label: PAST_DUE_LABEL.to_string(),
            kind: BucketKind::PastDue,
            month_start: None,
        });

        for offset in 0..horizon_months {
            let month = first_month
                .checked_add_months(Months::new(offset))
                .unwrap_or(NaiveDate::MAX);
            buckets.push(Bucket {
                index: offset as usize + 1,
                label: month.format("%Y-%m").to_string(),
                kind: BucketKind::Month,
                month_start: Some(month),
            });
        }

        buckets.push(Bucket {
            index: horizon_months as usize + 1,
            label: NEVER_LABEL.to_string(),
            kind: BucketKind::Never,
            month_start: None,
        });

        Self {
            as_of,
            horizon_months,
            buckets,
        }
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// 终端桶索引
    pub fn never_index(&self) -> usize {
        self.horizon_months as usize + 1
    }

    /// 最后一个月度桶索引
    pub fn last_month_index(&self) -> usize {
        self.horizon_months as usize
    }

    pub fn label(&self, index: usize) -> &str {
        self.buckets
            .get(index)
            .map(|b| b.label.as_str())
            .unwrap_or(NEVER_LABEL)
    }

    /// 交期 → 桶索引
    ///
    /// - 无交期 → 最早桶（逾期桶）
    /// - 交期早于基准日 → 逾期桶
    /// - 超出展望期 → 最后一个月度桶
    pub fn bucket_for_due_date(&self, due: Option<NaiveDate>) -> usize {
        let due = match due {
            Some(d) => d,
            None => return 0,
        };
        if due < self.as_of {
            return 0;
        }

        let offset = months_between(first_of_month(self.as_of), due);
        let index = offset.max(0) as usize + 1;
        index.min(self.last_month_index().max(1))
    }
}

/// 月初日期
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// 两个日期之间相差的自然月数（只看年月）
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to.year() as i64 - from.year() as i64) * 12 + (to.month() as i64 - from.month() as i64)
}

// ==========================================
// AllocationEntry - (桶, 类别, 数量) 三元组
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub bucket_index: usize,
    pub category: Category,
    pub quantity: Decimal,
}

// ==========================================
// AllocationResult - 单 SKU 分配结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub sku: String,
    pub on_hand: Decimal,

    /// 分类引擎判定的处置类别（超额部分使用）
    pub category: Category,

    /// 命中规则 ID（审计用）
    pub rule_id: String,

    pub hold: bool,

    pub pattern: Option<DemandPattern>,

    /// 已按 (桶, 类别) 排序
    pub entries: Vec<AllocationEntry>,

    pub horizon: BurnDownHorizon,

    /// 超额 / 年化用量（零用量为 None）
    pub burn_down_years: Option<Decimal>,

    /// 单位成本（来自库存表, 可缺失）
    #[serde(default)]
    pub unit_cost: Option<Decimal>,

    pub flags: Vec<DqFlag>,
}

impl AllocationResult {
    pub fn total_allocated(&self) -> Decimal {
        self.entries.iter().map(|e| e.quantity).sum()
    }

    pub fn quantity_for(&self, category: Category) -> Decimal {
        self.entries
            .iter()
            .filter(|e| e.category == category)
            .map(|e| e.quantity)
            .sum()
    }

    /// 超额数量（非必需类别合计）
    pub fn excess_qty(&self) -> Decimal {
        self.entries
            .iter()
            .filter(|e| !e.category.is_essential())
            .map(|e| e.quantity)
            .sum()
    }

    pub fn is_flagged(&self) -> bool {
        !self.flags.is_empty()
    }

    /// 指定数量的金额; 无单位成本或溢出时为 None
    pub fn value_of(&self, quantity: Decimal) -> Option<Decimal> {
        self.unit_cost.and_then(|cost| quantity.checked_mul(cost))
    }

    /// 在库金额 = 在库数量 × 单位成本
    pub fn extended_value(&self) -> Option<Decimal> {
        self.value_of(self.on_hand)
    }
}
