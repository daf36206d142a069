// ==========================================
// 库存消耗分析系统 - SKU 记录
// ==========================================
// 职责: 定义单次运行内的 SKU 时点快照（库存 + 用量历史 + 未结需求）
// 红线: 加载后不可变, 引擎只读
// ==========================================

use crate::domain::types::{DqFlag, SkuStatus};
use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// DemandLine - 未结需求/工单行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandLine {
    pub order_id: String,
    pub quantity: Decimal,
    pub due_date: Option<NaiveDate>,
    /// 工单开立日期（同桶内按此排序, 早者优先）
    pub opened_on: Option<NaiveDate>,
}

impl DemandLine {
    /// 相对基准日的逾期天数（未到期为负; 无交期为 None）
    pub fn days_past_due(&self, as_of: NaiveDate) -> Option<i64> {
        self.due_date.map(|due| (as_of - due).num_days())
    }
}

// ==========================================
// SkuRecord - SKU 快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuRecord {
    pub sku: String,
    pub on_hand: Decimal,
    pub status: SkuStatus,
    pub buyer_id: Option<String>,
    pub family: Option<String>,
    pub lead_time_days: u32,
    /// 完工百分比 0-100（缺失表示未知）
    pub poc: Option<Decimal>,
    /// 单位成本（缺失表示不参与金额汇总）
    #[serde(default)]
    pub unit_cost: Option<Decimal>,
    /// 月度历史用量, 由旧到新
    pub usage_history: Vec<Decimal>,
    pub demands: Vec<DemandLine>,
    /// 加载阶段产生的数据质量标记（如状态码无法识别）
    #[serde(default)]
    pub load_flags: Vec<DqFlag>,
}

impl SkuRecord {
    /// 创建最小可用记录（其余字段取默认值）
    pub fn new(sku: impl Into<String>, on_hand: Decimal) -> Self {
        Self {
            sku: sku.into(),
            on_hand,
            status: SkuStatus::Active,
            buyer_id: None,
            family: None,
            lead_time_days: 0,
            poc: None,
            unit_cost: None,
            usage_history: Vec::new(),
            demands: Vec::new(),
            load_flags: Vec::new(),
        }
    }

    /// 未结需求总量
    pub fn open_demand_qty(&self) -> Decimal {
        self.demands.iter().map(|d| d.quantity).sum()
    }

    /// 最大逾期天数（所有带交期的需求行中最老的一条）
    pub fn max_days_past_due(&self, as_of: NaiveDate) -> Option<i64> {
        self.demands
            .iter()
            .filter_map(|d| d.days_past_due(as_of))
            .max()
    }

    /// 是否为采购员归属物料
    pub fn is_buyer_attributed(&self) -> bool {
        self.buyer_id
            .as_deref()
            .map(|b| !b.trim().is_empty())
            .unwrap_or(false)
    }

    /// 回看窗口内是否存在未结需求
    ///
    /// 无交期的需求视为窗口内需求; 已逾期需求同样计入
    pub fn has_demand_within(&self, as_of: NaiveDate, months: u32) -> bool {
        let limit = as_of
            .checked_add_months(Months::new(months))
            .unwrap_or(NaiveDate::MAX);

        self.demands.iter().any(|d| {
            d.quantity > Decimal::ZERO
                && match d.due_date {
                    None => true,
                    Some(due) => due <= limit,
                }
        })
    }

    /// 最近 N 个月的用量切片
    pub fn trailing_usage(&self, months: usize) -> &[Decimal] {
        let start = self.usage_history.len().saturating_sub(months);
        &self.usage_history[start..]
    }
}
