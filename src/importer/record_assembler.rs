// ==========================================
// 库存消耗分析系统 - 记录组装器
// ==========================================
// 职责: 按 SKU 合并库存/用量/需求三张表 → SkuRecord
// 规则:
// 1) 库存表缺 sku 或缺在库数量 → 校验失败, 跳过并计数
// 2) 用量按月汇总, 只取基准月之前的期间, 由旧到新排列;
//    所有 SKU 共用同一月份网格: 起点 = min(用量表最早期间, 基准月 - 回看月数), 缺月补 0
// 3) 用量/需求行找不到库存 SKU → 孤儿行, 计数并记录日志
// 4) 状态码无法识别 → 按 Active 处理, 打 UNKNOWN_STATUS 标记
// ==========================================

use crate::domain::allocation::first_of_month;
use crate::domain::sku::{DemandLine, SkuRecord};
use crate::domain::types::{DqFlag, SkuStatus};
use crate::engine::error::EngineError;
use crate::importer::raw_record::{RawDemandRow, RawInventoryRow, RawUsageRow};
use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, instrument, warn};

/// 组装结果
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// 组装完成的记录（保持库存表顺序）
    pub records: Vec<SkuRecord>,
    /// 被拒绝的库存行（校验失败）
    pub rejected: Vec<EngineError>,
    pub orphan_usage_rows: usize,
    pub orphan_demand_rows: usize,
    /// 期间不早于基准月的用量行（不计入历史）
    pub ignored_usage_rows: usize,
}

impl LoadOutcome {
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

// ==========================================
// RecordAssembler
// ==========================================
#[derive(Debug, Clone)]
pub struct RecordAssembler {
    as_of: NaiveDate,
    lookback_months: u32,
}

impl RecordAssembler {
    pub fn new(as_of: NaiveDate, lookback_months: u32) -> Self {
        Self {
            as_of,
            lookback_months,
        }
    }

    /// 月份网格起点
    fn grid_start(&self, usage: &[RawUsageRow]) -> NaiveDate {
        let horizon_start = first_of_month(self.as_of);
        // 回看月数超出日期范围时退化为基准月, 仅由用量表决定起点
        let lookback_start = horizon_start
            .checked_sub_months(Months::new(self.lookback_months))
            .unwrap_or(horizon_start);
        usage
            .iter()
            .map(|r| first_of_month(r.period))
            .filter(|p| *p < horizon_start)
            .min()
            .map_or(lookback_start, |first| first.min(lookback_start))
    }

    #[instrument(skip_all, fields(
        inventory = inventory.len(),
        usage = usage.len(),
        demand = demand.len()
    ))]
    pub fn assemble(
        &self,
        inventory: Vec<RawInventoryRow>,
        usage: Vec<RawUsageRow>,
        demand: Vec<RawDemandRow>,
    ) -> LoadOutcome {
        let mut outcome = LoadOutcome::default();

        // === 步骤 1: 库存行校验 ===
        let mut base = Vec::with_capacity(inventory.len());
        for row in inventory {
            match self.base_record(row) {
                Ok(record) => base.push(record),
                Err(err) => {
                    warn!(error = %err, "库存行跳过");
                    outcome.rejected.push(err);
                }
            }
        }
        let known: HashSet<String> = base.iter().map(|r| r.sku.clone()).collect();

        // === 步骤 2: 用量按 SKU/月汇总 ===
        let horizon_start = first_of_month(self.as_of);
        let grid_start = self.grid_start(&usage);
        let mut usage_by_sku: HashMap<String, BTreeMap<NaiveDate, Decimal>> = HashMap::new();
        for row in usage {
            let sku = match row.sku {
                Some(sku) if known.contains(&sku) => sku,
                other => {
                    debug!(row = row.row_number, sku = ?other, "孤儿用量行");
                    outcome.orphan_usage_rows += 1;
                    continue;
                }
            };
            if row.period >= horizon_start {
                outcome.ignored_usage_rows += 1;
                continue;
            }
            *usage_by_sku
                .entry(sku)
                .or_default()
                .entry(row.period)
                .or_insert(Decimal::ZERO) += row.quantity;
        }

        // === 步骤 3: 需求按 SKU 归集 ===
        let mut demand_by_sku: HashMap<String, Vec<DemandLine>> = HashMap::new();
        for row in demand {
            let sku = match row.sku {
                Some(sku) if known.contains(&sku) => sku,
                other => {
                    debug!(row = row.row_number, sku = ?other, "孤儿需求行");
                    outcome.orphan_demand_rows += 1;
                    continue;
                }
            };
            let quantity = row.quantity.unwrap_or_else(|| {
                warn!(sku = %sku, row = row.row_number, "需求数量缺失, 按 0 处理");
                Decimal::ZERO
            });
            demand_by_sku.entry(sku).or_default().push(DemandLine {
                order_id: row
                    .order_id
                    .unwrap_or_else(|| format!("ROW-{}", row.row_number)),
                quantity,
                due_date: row.due_date,
                opened_on: row.opened_on,
            });
        }

        // === 步骤 4: 合并 ===
        for mut record in base {
            if let Some(months) = usage_by_sku.get(&record.sku) {
                record.usage_history = monthly_series(months, grid_start, horizon_start);
            }
            if let Some(lines) = demand_by_sku.get(&record.sku) {
                record.demands = lines.clone();
            }
            outcome.records.push(record);
        }

        if outcome.orphan_usage_rows > 0 || outcome.orphan_demand_rows > 0 {
            warn!(
                orphan_usage = outcome.orphan_usage_rows,
                orphan_demand = outcome.orphan_demand_rows,
                "存在无法匹配库存 SKU 的行"
            );
        }

        outcome
    }

    fn base_record(&self, row: RawInventoryRow) -> Result<SkuRecord, EngineError> {
        let sku = row.sku.ok_or_else(|| {
            EngineError::validation("", "sku", format!("库存表行 {} 主键缺失", row.row_number))
        })?;
        let on_hand = row.on_hand.ok_or_else(|| {
            EngineError::validation(
                &sku,
                "on_hand",
                format!("库存表行 {} 在库数量缺失", row.row_number),
            )
        })?;

        let mut record = SkuRecord::new(sku, on_hand);
        match row.status.as_deref().map(SkuStatus::from_code) {
            None => {}
            Some(Some(status)) => record.status = status,
            Some(None) => {
                warn!(sku = %record.sku, status = ?row.status, "状态码无法识别, 按 Active 处理");
                record.load_flags.push(DqFlag::UnknownStatus);
            }
        }
        record.buyer_id = row.buyer_id;
        record.family = row.family;
        record.lead_time_days = row.lead_time_days.unwrap_or(0);
        record.poc = row.poc;
        record.unit_cost = row.unit_cost;
        Ok(record)
    }
}

/// 网格起点 → 基准月前一月, 缺月补 0
fn monthly_series(
    months: &BTreeMap<NaiveDate, Decimal>,
    grid_start: NaiveDate,
    horizon_start: NaiveDate,
) -> Vec<Decimal> {
    let mut series = Vec::new();
    let mut cursor = grid_start;
    while cursor < horizon_start {
        series.push(months.get(&cursor).copied().unwrap_or(Decimal::ZERO));
        match cursor.checked_add_months(Months::new(1)) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 12).unwrap()
    }

    fn month(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn inv(row: usize, sku: Option<&str>, on_hand: Option<Decimal>) -> RawInventoryRow {
        RawInventoryRow {
            row_number: row,
            sku: sku.map(str::to_string),
            on_hand,
            ..Default::default()
        }
    }

    fn usage(row: usize, sku: &str, period: NaiveDate, qty: Decimal) -> RawUsageRow {
        RawUsageRow {
            row_number: row,
            sku: Some(sku.to_string()),
            period,
            quantity: qty,
        }
    }

    #[test]
    fn test_missing_key_rows_rejected() {
        let outcome = RecordAssembler::new(as_of(), 12).assemble(
            vec![
                inv(2, Some("A100"), Some(dec!(120))),
                inv(3, None, Some(dec!(5))),
                inv(4, Some("C300"), None),
            ],
            vec![],
            vec![],
        );
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.rejected_count(), 2);
        assert!(outcome.records[0].usage_history.is_empty());
    }

    #[test]
    fn test_usage_gaps_filled_and_future_ignored() {
        let outcome = RecordAssembler::new(as_of(), 12).assemble(
            vec![inv(2, Some("A100"), Some(dec!(10)))],
            vec![
                usage(2, "A100", month(2026, 1), dec!(4)),
                usage(3, "A100", month(2026, 3), dec!(6)),
                usage(4, "A100", month(2026, 3), dec!(1)),
                usage(5, "A100", month(2026, 5), dec!(99)),
            ],
            vec![],
        );
        // 网格 2025-05 ~ 2026-04: 前 8 月补 0, 1 月 4, 2 月补 0, 3 月 7, 4 月补 0
        // 5 月为基准月, 不计入
        let mut expected = vec![dec!(0); 8];
        expected.extend([dec!(4), dec!(0), dec!(7), dec!(0)]);
        assert_eq!(outcome.records[0].usage_history, expected);
        assert_eq!(outcome.ignored_usage_rows, 1);
    }

    #[test]
    fn test_sparse_sku_filled_over_lookback_window() {
        let outcome = RecordAssembler::new(as_of(), 12).assemble(
            vec![inv(2, Some("S1"), Some(dec!(10)))],
            vec![
                usage(2, "S1", month(2026, 3), dec!(10)),
                usage(3, "S1", month(2026, 4), dec!(10)),
            ],
            vec![],
        );
        let history = &outcome.records[0].usage_history;
        assert_eq!(history.len(), 12);
        assert!(history[..10].iter().all(|q| q.is_zero()));
        assert_eq!(history[10..], [dec!(10), dec!(10)]);
        let total: Decimal = history.iter().sum();
        assert_eq!(total / Decimal::from(history.len()), dec!(20) / dec!(12));
    }

    #[test]
    fn test_grid_starts_at_earliest_table_period() {
        // 另一 SKU 的记录早于回看窗口 → 所有 SKU 自该月起
        let outcome = RecordAssembler::new(as_of(), 12).assemble(
            vec![
                inv(2, Some("OLD"), Some(dec!(1))),
                inv(3, Some("NEW"), Some(dec!(1))),
                inv(4, Some("NONE"), Some(dec!(1))),
            ],
            vec![
                usage(2, "OLD", month(2024, 11), dec!(2)),
                usage(3, "NEW", month(2026, 4), dec!(3)),
            ],
            vec![],
        );
        // 2024-11 ~ 2026-04 共 18 个月
        assert_eq!(outcome.records[0].usage_history.len(), 18);
        assert_eq!(outcome.records[0].usage_history[0], dec!(2));
        assert_eq!(outcome.records[1].usage_history.len(), 18);
        assert_eq!(outcome.records[1].usage_history[17], dec!(3));
        // 无用量行 → 空历史
        assert!(outcome.records[2].usage_history.is_empty());
    }

    #[test]
    fn test_orphans_counted() {
        let outcome = RecordAssembler::new(as_of(), 12).assemble(
            vec![inv(2, Some("A100"), Some(dec!(10)))],
            vec![usage(2, "ZZZ", month(2026, 1), dec!(4))],
            vec![RawDemandRow {
                row_number: 2,
                sku: None,
                order_id: Some("WO-1".to_string()),
                quantity: Some(dec!(3)),
                due_date: None,
                opened_on: None,
            }],
        );
        assert_eq!(outcome.orphan_usage_rows, 1);
        assert_eq!(outcome.orphan_demand_rows, 1);
        assert!(outcome.records[0].demands.is_empty());
    }

    #[test]
    fn test_status_and_demand_join() {
        let mut row = inv(2, Some("A100"), Some(dec!(10)));
        row.status = Some("X9".to_string());
        let mut held = inv(3, Some("B200"), Some(dec!(5)));
        held.status = Some("H".to_string());

        let outcome = RecordAssembler::new(as_of(), 12).assemble(
            vec![row, held],
            vec![],
            vec![RawDemandRow {
                row_number: 2,
                sku: Some("A100".to_string()),
                order_id: None,
                quantity: None,
                due_date: NaiveDate::from_ymd_opt(2026, 6, 1),
                opened_on: None,
            }],
        );

        let a = &outcome.records[0];
        assert_eq!(a.status, SkuStatus::Active);
        assert_eq!(a.load_flags, vec![DqFlag::UnknownStatus]);
        assert_eq!(a.demands.len(), 1);
        assert_eq!(a.demands[0].order_id, "ROW-2");
        assert_eq!(a.demands[0].quantity, Decimal::ZERO);

        assert_eq!(outcome.records[1].status, SkuStatus::Hold);
    }

    #[test]
    fn test_unit_cost_carried_to_record() {
        let mut row = inv(2, Some("A100"), Some(dec!(10)));
        row.unit_cost = Some(dec!(3.25));
        let outcome = RecordAssembler::new(as_of(), 12).assemble(
            vec![row, inv(3, Some("B200"), Some(dec!(1)))],
            vec![],
            vec![],
        );
        assert_eq!(outcome.records[0].unit_cost, Some(dec!(3.25)));
        assert_eq!(outcome.records[1].unit_cost, None);
    }
}
