// ==========================================
// 库存消耗分析系统 - 领域类型定义
// ==========================================
// 职责: 状态码 / 处置类别 / 需求模式 / 消耗区间 / 数据质量标记
// 红线: 类别是封闭枚举, 输出标签是下游透视表的固定契约
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// SKU 状态码 (Status Code)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkuStatus {
    Active,   // 正常
    Hold,     // 冻结（人工/质量冻结）
    Inactive, // 停用
    Obsolete, // 呆滞/淘汰
}

impl fmt::Display for SkuStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkuStatus::Active => write!(f, "ACTIVE"),
            SkuStatus::Hold => write!(f, "HOLD"),
            SkuStatus::Inactive => write!(f, "INACTIVE"),
            SkuStatus::Obsolete => write!(f, "OBSOLETE"),
        }
    }
}

impl SkuStatus {
    /// 从源系统状态码解析
    ///
    /// 未识别的状态码返回 None，由调用方决定是否打数据质量标记
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "" | "A" | "ACTIVE" => Some(SkuStatus::Active),
            "H" | "HOLD" | "ON_HOLD" | "ON HOLD" => Some(SkuStatus::Hold),
            "I" | "INACTIVE" => Some(SkuStatus::Inactive),
            "O" | "OBS" | "OBSOLETE" => Some(SkuStatus::Obsolete),
            _ => None,
        }
    }
}

// ==========================================
// 处置类别 (Category)
// ==========================================
// 每条分桶记录恰好带一个类别; 顺序即输出排序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    SafetyStock,         // 安全库存
    OpenDemandCoverage,  // 未结需求覆盖
    ExcessBuyer,         // 采购超额
    ExcessFinishedGoods, // 成品超额
    ReworkCandidate,     // 返工候选
    Obsolete,            // 呆滞
    Hold,                // 冻结
    PastDueReserved,     // 逾期预留
    Unclassified,        // 未分类（人工复核）
}

impl Category {
    /// 全部类别（固定顺序）
    pub const ALL: [Category; 9] = [
        Category::SafetyStock,
        Category::OpenDemandCoverage,
        Category::ExcessBuyer,
        Category::ExcessFinishedGoods,
        Category::ReworkCandidate,
        Category::Obsolete,
        Category::Hold,
        Category::PastDueReserved,
        Category::Unclassified,
    ];

    /// 输出标签（报表列值）
    pub fn label(&self) -> &'static str {
        match self {
            Category::SafetyStock => "Safety Stock",
            Category::OpenDemandCoverage => "Open Demand Coverage",
            Category::ExcessBuyer => "Excess-Buyer",
            Category::ExcessFinishedGoods => "Excess-Finished-Goods",
            Category::ReworkCandidate => "Rework Candidate",
            Category::Obsolete => "Obsolete",
            Category::Hold => "Hold",
            Category::PastDueReserved => "Past-Due-Reserved",
            Category::Unclassified => "Unclassified",
        }
    }

    /// 是否为"必需"库存（安全库存 + 需求覆盖），其余均视为超额处置
    pub fn is_essential(&self) -> bool {
        matches!(self, Category::SafetyStock | Category::OpenDemandCoverage)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ==========================================
// 需求模式 (Demand Pattern)
// ==========================================
// 按回看窗口内的命中月数/峰值/连续性分段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DemandPattern {
    TrueBuyOut,         // 一次性买断
    EmergingBuyOut,     // 新兴需求
    HighRunRate,        // 高频连续
    SeasonalBuyOut,     // 季节性
    SpikeDrivenBuyOut,  // 尖峰驱动
    IntermittentBuyOut, // 间歇性
}

impl DemandPattern {
    pub fn label(&self) -> &'static str {
        match self {
            DemandPattern::TrueBuyOut => "True Buy-Out",
            DemandPattern::EmergingBuyOut => "Emerging Buy-Out",
            DemandPattern::HighRunRate => "High Run-Rate",
            DemandPattern::SeasonalBuyOut => "Seasonal Buy-Out",
            DemandPattern::SpikeDrivenBuyOut => "Spike-Driven Buy-Out",
            DemandPattern::IntermittentBuyOut => "Intermittent Buy-Out",
        }
    }

    /// 预测覆写时强制归零的模式
    pub fn forces_zero_forecast(&self) -> bool {
        matches!(self, DemandPattern::TrueBuyOut | DemandPattern::EmergingBuyOut)
    }
}

impl fmt::Display for DemandPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ==========================================
// 消耗区间标签 (Burn-Down Horizon)
// ==========================================
// 顺序: 越靠后消耗越慢
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BurnDownHorizon {
    NoInventory,       // 无库存
    NoExcess,          // 仅安全库存
    ZeroToSixMonths,   // 0-6 个月
    SixToTwelveMonths, // 6-12 个月
    OneToTwoYears,     // 1-2 年
    TwoToThreeYears,   // 2-3 年
    ThreePlusYears,    // 3 年以上
    Never,             // 无法消耗
}

impl BurnDownHorizon {
    pub fn label(&self) -> &'static str {
        match self {
            BurnDownHorizon::NoInventory => "No Inventory",
            BurnDownHorizon::NoExcess => "No Excess",
            BurnDownHorizon::ZeroToSixMonths => "0-6 Months",
            BurnDownHorizon::SixToTwelveMonths => "6-12 Months",
            BurnDownHorizon::OneToTwoYears => "1-2 Years",
            BurnDownHorizon::TwoToThreeYears => "2-3 Years",
            BurnDownHorizon::ThreePlusYears => "3+ Years",
            BurnDownHorizon::Never => "Never",
        }
    }

    /// 由"第几个月消耗完"映射区间（0 = 逾期桶，按立即消耗处理）
    pub fn from_month_index(month: usize) -> Self {
        match month {
            0..=6 => BurnDownHorizon::ZeroToSixMonths,
            7..=12 => BurnDownHorizon::SixToTwelveMonths,
            13..=24 => BurnDownHorizon::OneToTwoYears,
            25..=36 => BurnDownHorizon::TwoToThreeYears,
            _ => BurnDownHorizon::ThreePlusYears,
        }
    }
}

impl fmt::Display for BurnDownHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ==========================================
// 数据质量标记 (DataQualityWarning)
// ==========================================
// 标记不阻断处理, 仅计入运行汇总
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DqFlag {
    NullPoc,           // 完工百分比缺失
    NoUsageHistory,    // 无历史用量, 安全库存未定义
    ShortUsageHistory, // 历史用量不足回看窗口（低置信度）
    Intermittent,      // 窗口均值为零
    UnknownStatus,     // 状态码无法识别, 按 ACTIVE 处理
    ManualReview,      // 无规则命中, 待人工复核
}

impl fmt::Display for DqFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DqFlag::NullPoc => write!(f, "NULL_POC"),
            DqFlag::NoUsageHistory => write!(f, "NO_USAGE_HISTORY"),
            DqFlag::ShortUsageHistory => write!(f, "SHORT_USAGE_HISTORY"),
            DqFlag::Intermittent => write!(f, "INTERMITTENT"),
            DqFlag::UnknownStatus => write!(f, "UNKNOWN_STATUS"),
            DqFlag::ManualReview => write!(f, "MANUAL_REVIEW"),
        }
    }
}
