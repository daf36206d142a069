// ==========================================
// 库存消耗分析系统 - 导入中间结构
// ==========================================
// 职责: 字段映射后的三张源表行（尚未按 SKU 组装）
// ==========================================

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// 库存表行
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawInventoryRow {
    pub row_number: usize,
    pub sku: Option<String>,
    pub on_hand: Option<Decimal>,
    /// 原始状态码（A/H/I/O 或全称）
    pub status: Option<String>,
    pub buyer_id: Option<String>,
    pub family: Option<String>,
    pub lead_time_days: Option<u32>,
    pub poc: Option<Decimal>,
    pub unit_cost: Option<Decimal>,
}

/// 用量表行（按月）
#[derive(Debug, Clone, PartialEq)]
pub struct RawUsageRow {
    pub row_number: usize,
    pub sku: Option<String>,
    /// 期间（当月 1 日）
    pub period: NaiveDate,
    pub quantity: Decimal,
}

/// 需求表行（未结工单/订单）
#[derive(Debug, Clone, PartialEq)]
pub struct RawDemandRow {
    pub row_number: usize,
    pub sku: Option<String>,
    pub order_id: Option<String>,
    pub quantity: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub opened_on: Option<NaiveDate>,
}
