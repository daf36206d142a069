// ==========================================
// 库存消耗分析系统 - 处置分类规则引擎
// ==========================================
// 职责: 按固定优先级为 SKU 判定处置类别
// 红线: 规则表顺序即优先级, 首个命中规则生效（短路, 不回溯）
// 输入: SkuRecord + UsageProfile + EngineConfig
// 输出: Classification（类别 + 冻结标记 + 命中规则 + 数据质量标记）
// ==========================================

use crate::config::EngineConfig;
use crate::domain::sku::SkuRecord;
use crate::domain::types::{Category, DqFlag, SkuStatus};
use crate::domain::usage::UsageProfile;
use rust_decimal::Decimal;
use serde::Serialize;

/// 规则求值上下文
pub struct RuleContext<'a> {
    pub record: &'a SkuRecord,
    pub profile: &'a UsageProfile,
    pub config: &'a EngineConfig,
}

/// 分类规则: 谓词 → 类别
pub struct ClassificationRule {
    pub id: &'static str,
    pub category: Category,
    /// 命中时附加的数据质量标记
    pub flag: Option<DqFlag>,
    pub matches: fn(&RuleContext<'_>) -> bool,
}

/// 分类结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub category: Category,
    pub hold: bool,
    pub rule_id: &'static str,
    pub flags: Vec<DqFlag>,
}

// ==========================================
// 规则表（顺序即优先级）
// ==========================================
// 1) HOLD             冻结状态 → Hold（绝对优先）
// 2) PAST_DUE         工单逾期天数 > 阈值 → Past-Due-Reserved
// 3) NO_USAGE_HISTORY 无历史用量 → Unclassified + 标记
// 4) NULL_POC         完工百分比缺失 → Unclassified + 标记
// 5) REWORK           完工百分比 < 下限 且 有库存 → Rework Candidate
// 6) OBSOLETE         呆滞状态 → Obsolete
// 7) EXCESS_BUYER     采购员归属 且 回看期内无需求 → Excess-Buyer
// 8) EXCESS_FG        成品 且 回看期内无订单 → Excess-Finished-Goods
// 9) DEFAULT          → Unclassified + 人工复核
pub const RULES: &[ClassificationRule] = &[
    ClassificationRule {
        id: "HOLD",
        category: Category::Hold,
        flag: None,
        matches: is_hold,
    },
    ClassificationRule {
        id: "PAST_DUE",
        category: Category::PastDueReserved,
        flag: None,
        matches: is_past_due,
    },
    ClassificationRule {
        id: "NO_USAGE_HISTORY",
        category: Category::Unclassified,
        flag: Some(DqFlag::NoUsageHistory),
        matches: has_no_usage_history,
    },
    ClassificationRule {
        id: "NULL_POC",
        category: Category::Unclassified,
        flag: Some(DqFlag::NullPoc),
        matches: has_null_poc,
    },
    ClassificationRule {
        id: "REWORK",
        category: Category::ReworkCandidate,
        flag: None,
        matches: is_rework_candidate,
    },
    ClassificationRule {
        id: "OBSOLETE",
        category: Category::Obsolete,
        flag: None,
        matches: is_obsolete,
    },
    ClassificationRule {
        id: "EXCESS_BUYER",
        category: Category::ExcessBuyer,
        flag: None,
        matches: is_excess_buyer,
    },
    ClassificationRule {
        id: "EXCESS_FG",
        category: Category::ExcessFinishedGoods,
        flag: None,
        matches: is_excess_finished_goods,
    },
    ClassificationRule {
        id: "DEFAULT",
        category: Category::Unclassified,
        flag: Some(DqFlag::ManualReview),
        matches: always,
    },
];

fn is_hold(ctx: &RuleContext<'_>) -> bool {
    ctx.record.status == SkuStatus::Hold
}

fn is_past_due(ctx: &RuleContext<'_>) -> bool {
    ctx.record
        .max_days_past_due(ctx.config.as_of)
        .map(|days| days > ctx.config.past_due_threshold_days)
        .unwrap_or(false)
}

fn has_no_usage_history(ctx: &RuleContext<'_>) -> bool {
    !ctx.profile.is_defined()
}

fn has_null_poc(ctx: &RuleContext<'_>) -> bool {
    ctx.record.poc.is_none()
}

fn is_rework_candidate(ctx: &RuleContext<'_>) -> bool {
    match ctx.record.poc {
        Some(poc) => poc < ctx.config.completion_floor && ctx.record.on_hand > Decimal::ZERO,
        None => false,
    }
}

fn is_obsolete(ctx: &RuleContext<'_>) -> bool {
    ctx.record.status == SkuStatus::Obsolete
}

fn is_excess_buyer(ctx: &RuleContext<'_>) -> bool {
    if !ctx.record.is_buyer_attributed() {
        return false;
    }
    let lookback = ctx.config.lookback_months;
    let no_open_demand = !ctx.record.has_demand_within(ctx.config.as_of, lookback);
    let no_recent_usage = ctx
        .record
        .trailing_usage(lookback as usize)
        .iter()
        .all(|q| q.is_zero());
    no_open_demand && no_recent_usage
}

fn is_excess_finished_goods(ctx: &RuleContext<'_>) -> bool {
    ctx.config.is_finished_goods_family(ctx.record.family.as_deref())
        && !ctx
            .record
            .has_demand_within(ctx.config.as_of, ctx.config.lookback_months)
}

fn always(_ctx: &RuleContext<'_>) -> bool {
    true
}

// ==========================================
// ClassificationEngine - 首个命中规则生效的调度器
// ==========================================
pub struct ClassificationEngine {
    rules: &'static [ClassificationRule],
}

impl Default for ClassificationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassificationEngine {
    pub fn new() -> Self {
        Self { rules: RULES }
    }

    pub fn rules(&self) -> &'static [ClassificationRule] {
        self.rules
    }

    /// 判定处置类别（纯函数, 相同输入恒得相同结果）
    pub fn classify(&self, ctx: &RuleContext<'_>) -> Classification {
        let hold = ctx.record.status == SkuStatus::Hold;

        for rule in self.rules {
            if (rule.matches)(ctx) {
                return Classification {
                    category: rule.category,
                    hold,
                    rule_id: rule.id,
                    flags: rule.flag.into_iter().collect(),
                };
            }
        }

        // 规则表以 DEFAULT 结尾, 此处仅在自定义空表时到达
        Classification {
            category: Category::Unclassified,
            hold,
            rule_id: "DEFAULT",
            flags: vec![DqFlag::ManualReview],
        }
    }
}
