// ==========================================
// 库存消耗分析系统 - 用量画像
// ==========================================
// 职责: 每个 SKU 一份, 由用量计算器一次性生成, 下游只读
// ==========================================

use crate::domain::types::{DemandPattern, DqFlag};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 用量画像 (Usage Profile)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageProfile {
    /// 实际参与计算的月份数
    pub window_len: usize,

    /// 窗口中位数用量
    pub median: Decimal,

    /// 窗口平均用量（消耗速率）
    pub average: Decimal,

    /// 窗口最大单月用量
    pub max_month: Decimal,

    /// 波动系数 = 标准差 / 均值（均值为零时取 0）
    pub volatility: f64,

    /// 安全库存阈值（无历史用量时为 None）
    pub safety_stock: Option<Decimal>,

    /// 需求模式（无历史用量时为 None）
    pub pattern: Option<DemandPattern>,

    /// 窗口不足回看月数
    pub low_confidence: bool,

    pub flags: Vec<DqFlag>,
}

impl UsageProfile {
    /// 无历史用量时的未定义画像
    pub fn undefined() -> Self {
        Self {
            window_len: 0,
            median: Decimal::ZERO,
            average: Decimal::ZERO,
            max_month: Decimal::ZERO,
            volatility: 0.0,
            safety_stock: None,
            pattern: None,
            low_confidence: true,
            flags: vec![DqFlag::NoUsageHistory],
        }
    }

    /// 安全库存是否可用
    pub fn is_defined(&self) -> bool {
        self.safety_stock.is_some()
    }

    /// 真零需求 SKU（窗口平均用量为零）
    pub fn is_zero_usage(&self) -> bool {
        self.average.is_zero()
    }
}
