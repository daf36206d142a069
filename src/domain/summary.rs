// ==========================================
// 库存消耗分析系统 - 运行汇总
// ==========================================
// 职责: 统计跳过/标记/失败记录数, 保证任何排除都可见
// 金额: 数量 × 单位成本, 仅统计带成本的 SKU; 无成本的 SKU 计入 unvalued
// ==========================================

use crate::domain::allocation::AllocationResult;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// 运行汇总 (Run Summary)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub as_of: NaiveDate,
    pub started_at: DateTime<Utc>,

    /// 输入记录总数
    pub total: usize,
    /// 成功分配
    pub processed: usize,
    /// 校验失败跳过 (ValidationError)
    pub skipped: usize,
    /// 带数据质量标记（已处理）
    pub flagged: usize,
    /// 守恒校验失败 (ConservationViolation)
    pub failed: usize,

    /// 类别标签 → 数量合计
    pub by_category: BTreeMap<String, Decimal>,
    /// 消耗区间标签 → SKU 数
    pub by_horizon: BTreeMap<String, usize>,

    /// 类别标签 → 金额合计
    #[serde(default)]
    pub value_by_category: BTreeMap<String, Decimal>,
    /// 消耗区间标签 → 在库金额合计
    #[serde(default)]
    pub value_by_horizon: BTreeMap<String, Decimal>,
    /// 在库金额总计
    #[serde(default)]
    pub total_value: Decimal,
    /// 无单位成本、未计入金额的已处理 SKU 数
    #[serde(default)]
    pub unvalued: usize,
}

impl RunSummary {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            as_of,
            started_at: Utc::now(),
            total: 0,
            processed: 0,
            skipped: 0,
            flagged: 0,
            failed: 0,
            by_category: BTreeMap::new(),
            by_horizon: BTreeMap::new(),
            value_by_category: BTreeMap::new(),
            value_by_horizon: BTreeMap::new(),
            total_value: Decimal::ZERO,
            unvalued: 0,
        }
    }

    /// 累计一条成功结果
    pub fn record_result(&mut self, result: &AllocationResult) {
        self.processed += 1;
        if result.is_flagged() {
            self.flagged += 1;
        }
        for entry in &result.entries {
            *self
                .by_category
                .entry(entry.category.label().to_string())
                .or_insert(Decimal::ZERO) += entry.quantity;
        }
        *self
            .by_horizon
            .entry(result.horizon.label().to_string())
            .or_insert(0) += 1;
        self.record_value(result);
    }

    fn record_value(&mut self, result: &AllocationResult) {
        let Some(extended) = result.extended_value() else {
            self.unvalued += 1;
            return;
        };
        for entry in &result.entries {
            let value = result.value_of(entry.quantity).unwrap_or(Decimal::MAX);
            let slot = self
                .value_by_category
                .entry(entry.category.label().to_string())
                .or_insert(Decimal::ZERO);
            *slot = slot.saturating_add(value);
        }
        let slot = self
            .value_by_horizon
            .entry(result.horizon.label().to_string())
            .or_insert(Decimal::ZERO);
        *slot = slot.saturating_add(extended);
        self.total_value = self.total_value.saturating_add(extended);
    }

    /// 计入加载阶段已拒绝的行（缺主键/缺在库）
    pub fn record_load_rejections(&mut self, count: usize) {
        self.total += count;
        self.skipped += count;
    }

    /// 所有输入记录都有去向
    pub fn is_balanced(&self) -> bool {
        self.total == self.processed + self.skipped + self.failed
    }
}
