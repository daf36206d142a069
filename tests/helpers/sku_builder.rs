// ==========================================
// 测试数据构建器 - SkuRecord
// ==========================================

use chrono::NaiveDate;
use rust_decimal::Decimal;
use siop_burndown::config::EngineConfig;
use siop_burndown::domain::{DemandLine, SkuRecord, SkuStatus};

/// 集成测试统一基准日
pub fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 10).unwrap()
}

pub fn config() -> EngineConfig {
    EngineConfig::with_as_of(as_of())
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub struct SkuBuilder {
    record: SkuRecord,
}

impl SkuBuilder {
    /// 默认: 完工 100 / 提前期 30 天 / 状态 Active / 无用量
    pub fn new(sku: &str, on_hand: i64) -> Self {
        let mut record = SkuRecord::new(sku, Decimal::from(on_hand));
        record.poc = Some(Decimal::from(100));
        record.lead_time_days = 30;
        Self { record }
    }

    pub fn on_hand(mut self, qty: Decimal) -> Self {
        self.record.on_hand = qty;
        self
    }

    /// 连续 n 个月相同用量
    pub fn flat_usage(mut self, qty: i64, months: usize) -> Self {
        self.record.usage_history = vec![Decimal::from(qty); months];
        self
    }

    pub fn usage(mut self, values: &[i64]) -> Self {
        self.record.usage_history = values.iter().map(|v| Decimal::from(*v)).collect();
        self
    }

    pub fn lead_time_days(mut self, days: u32) -> Self {
        self.record.lead_time_days = days;
        self
    }

    pub fn status(mut self, status: SkuStatus) -> Self {
        self.record.status = status;
        self
    }

    pub fn buyer(mut self, buyer: &str) -> Self {
        self.record.buyer_id = Some(buyer.to_string());
        self
    }

    pub fn family(mut self, family: &str) -> Self {
        self.record.family = Some(family.to_string());
        self
    }

    pub fn poc(mut self, poc: Option<i64>) -> Self {
        self.record.poc = poc.map(Decimal::from);
        self
    }

    pub fn demand(mut self, order_id: &str, qty: i64, due: Option<NaiveDate>) -> Self {
        self.record.demands.push(DemandLine {
            order_id: order_id.to_string(),
            quantity: Decimal::from(qty),
            due_date: due,
            opened_on: None,
        });
        self
    }

    pub fn build(self) -> SkuRecord {
        self.record
    }
}

/// 场景 A100: 在库 120, 安全库存 20, 需求 30 落在桶 2, 月用量 10
pub fn scenario_a100() -> SkuRecord {
    SkuBuilder::new("A100", 120)
        .flat_usage(10, 12)
        .lead_time_days(60)
        .demand("WO-1", 30, Some(date(2026, 2, 20)))
        .build()
}

/// 场景 B200: 在库 50, 12 个月零用量
pub fn scenario_b200() -> SkuRecord {
    SkuBuilder::new("B200", 50)
        .flat_usage(0, 12)
        .buyer("B01")
        .build()
}
