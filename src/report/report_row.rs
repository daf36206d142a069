// ==========================================
// 库存消耗分析系统 - 报表行
// ==========================================
// 职责: 分配结果 → 扁平报表行（每个 SKU/桶/类别 一行）
// 红线: 列顺序固定 sku,bucket,category,quantity,burn_down_horizon
// ==========================================

use crate::domain::allocation::{AllocationResult, BucketCalendar};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 报表列（顺序即输出顺序）
pub const REPORT_COLUMNS: [&str; 5] = ["sku", "bucket", "category", "quantity", "burn_down_horizon"];

/// 报表行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub sku: String,
    #[serde(rename = "bucket")]
    pub bucket_label: String,
    #[serde(rename = "category")]
    pub category_label: String,
    pub quantity: Decimal,
    #[serde(rename = "burn_down_horizon")]
    pub burn_down_label: String,
}

/// 展开单个 SKU 的分配结果
///
/// # 参数
/// - result: 单 SKU 分配结果（三元组已按桶/类别排序）
/// - calendar: 桶序列（提供桶标签）
/// - scale: 输出数量保留小数位（舍入后为零的三元组不输出）
pub fn build_rows(result: &AllocationResult, calendar: &BucketCalendar, scale: u32) -> Vec<ReportRow> {
    let horizon = result.horizon.label();
    result
        .entries
        .iter()
        .filter_map(|e| {
            // 按输出精度舍入后为零的数量不输出
            let quantity = e.quantity.round_dp(scale).normalize();
            if quantity <= Decimal::ZERO {
                return None;
            }
            Some(ReportRow {
                sku: result.sku.clone(),
                bucket_label: calendar.label(e.bucket_index).to_string(),
                category_label: e.category.label().to_string(),
                quantity,
                burn_down_label: horizon.to_string(),
            })
        })
        .collect()
}

/// 展开整批结果（保持结果顺序）
pub fn build_report(results: &[AllocationResult], calendar: &BucketCalendar, scale: u32) -> Vec<ReportRow> {
    results
        .iter()
        .flat_map(|r| build_rows(r, calendar, scale))
        .collect()
}
