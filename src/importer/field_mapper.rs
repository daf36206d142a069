// ==========================================
// 库存消耗分析系统 - 字段映射器实现
// ==========================================
// 职责: 源字段 → 标准字段映射 + 类型转换
// 说明: 每个标准字段支持多个列名别名（中英文表头均可）
// ==========================================

use crate::domain::allocation::first_of_month;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::raw_record::{RawDemandRow, RawInventoryRow, RawUsageRow};
use crate::importer::record_source_trait::RawRow;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

pub const TABLE_INVENTORY: &str = "inventory";
pub const TABLE_USAGE: &str = "usage";
pub const TABLE_DEMAND: &str = "demand";

pub struct FieldMapper;

impl FieldMapper {
    /// 库存表行映射
    ///
    /// sku / on_hand 缺失不报错, 由组装阶段按校验失败跳过
    pub fn map_inventory(&self, row: &RawRow, row_number: usize) -> ImportResult<RawInventoryRow> {
        let t = TABLE_INVENTORY;
        Ok(RawInventoryRow {
            row_number,
            sku: self.get_string(row, "sku"),
            on_hand: self.parse_decimal(row, "on_hand", t, row_number)?,
            status: self.get_string(row, "status"),
            buyer_id: self.get_string(row, "buyer"),
            family: self.get_string(row, "family"),
            lead_time_days: self.parse_days(row, "lead_time_days", t, row_number)?,
            poc: self.parse_decimal(row, "poc", t, row_number)?,
            unit_cost: self.parse_decimal(row, "unit_cost", t, row_number)?,
        })
    }

    /// 用量表行映射（数量缺失按 0）
    pub fn map_usage(&self, row: &RawRow, row_number: usize) -> ImportResult<RawUsageRow> {
        let t = TABLE_USAGE;
        let raw_period = self.get_string(row, "period").unwrap_or_default();
        let period = parse_period(&raw_period).ok_or(ImportError::PeriodFormatError {
            row: row_number,
            value: raw_period.clone(),
        })?;

        Ok(RawUsageRow {
            row_number,
            sku: self.get_string(row, "sku"),
            period,
            quantity: self
                .parse_decimal(row, "quantity", t, row_number)?
                .unwrap_or(Decimal::ZERO),
        })
    }

    /// 需求表行映射
    pub fn map_demand(&self, row: &RawRow, row_number: usize) -> ImportResult<RawDemandRow> {
        let t = TABLE_DEMAND;
        Ok(RawDemandRow {
            row_number,
            sku: self.get_string(row, "sku"),
            order_id: self.get_string(row, "order_id"),
            quantity: self.parse_decimal(row, "quantity", t, row_number)?,
            due_date: self.parse_date(row, "due_date", t, row_number)?,
            opened_on: self.parse_date(row, "opened_on", t, row_number)?,
        })
    }

    /// 提取字符串字段（返回 Option），支持多个可能的列名（别名）
    fn get_string(&self, row: &RawRow, key: &str) -> Option<String> {
        let aliases: &[&str] = match key {
            "sku" => &["sku", "SKU", "item", "item_id", "part_number", "物料号", "料号"],
            "on_hand" => &["on_hand", "on_hand_qty", "qty_on_hand", "在库数量", "库存数量"],
            "status" => &["status", "status_code", "sku_status", "状态", "状态码"],
            "buyer" => &["buyer", "buyer_id", "buyer_code", "采购员"],
            "family" => &["family", "product_family", "产品族"],
            "lead_time_days" => &["lead_time_days", "lead_time", "提前期", "提前期(天)"],
            "poc" => &["poc", "percent_complete", "完工百分比"],
            "unit_cost" => &["unit_cost", "avg_std_cost", "Avg Std Cost", "std_cost", "单位成本", "标准成本"],
            "period" => &["period", "month", "fiscal_period", "期间", "月份"],
            "quantity" => &["quantity", "qty", "usage_qty", "demand_qty", "数量"],
            "order_id" => &["order_id", "work_order", "order_no", "工单号", "订单号"],
            "due_date" => &["due_date", "need_date", "交期", "需求日期"],
            "opened_on" => &["opened_on", "open_date", "created_on", "开单日期"],
            _ => &[],
        };

        aliases
            .iter()
            .chain(std::iter::once(&key))
            .filter_map(|alias| row.get(*alias))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// 解析十进制数（容忍千分位逗号）
    fn parse_decimal(
        &self,
        row: &RawRow,
        key: &str,
        table: &str,
        row_number: usize,
    ) -> ImportResult<Option<Decimal>> {
        match self.get_string(row, key) {
            None => Ok(None),
            Some(value) => {
                let cleaned = value.replace(',', "");
                Decimal::from_str(&cleaned)
                    .or_else(|_| Decimal::from_scientific(&cleaned))
                    .map(Some)
                    .map_err(|_| ImportError::TypeConversionError {
                        table: table.to_string(),
                        row: row_number,
                        field: key.to_string(),
                        message: format!("无法解析为数值: {}", value),
                    })
            }
        }
    }

    /// 解析天数（非负, 小数向上取整）
    fn parse_days(
        &self,
        row: &RawRow,
        key: &str,
        table: &str,
        row_number: usize,
    ) -> ImportResult<Option<u32>> {
        let conversion_error = |value: String| ImportError::TypeConversionError {
            table: table.to_string(),
            row: row_number,
            field: key.to_string(),
            message: format!("无法解析为非负天数: {}", value),
        };

        match self.parse_decimal(row, key, table, row_number)? {
            None => Ok(None),
            Some(days) if days < Decimal::ZERO => Err(conversion_error(days.to_string())),
            Some(days) => days
                .ceil()
                .to_u32()
                .map(Some)
                .ok_or_else(|| conversion_error(days.to_string())),
        }
    }

    /// 解析日期（YYYY-MM-DD / YYYYMMDD / YYYY/MM/DD）
    fn parse_date(
        &self,
        row: &RawRow,
        key: &str,
        table: &str,
        row_number: usize,
    ) -> ImportResult<Option<NaiveDate>> {
        match self.get_string(row, key) {
            None => Ok(None),
            Some(value) => parse_date(&value)
                .map(Some)
                .ok_or(ImportError::DateFormatError {
                    table: table.to_string(),
                    row: row_number,
                    field: key.to_string(),
                    value,
                }),
        }
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    // Excel/SQLite 可能带时间部分
    let date_part = value.split([' ', 'T']).next().unwrap_or(value);
    ["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// 解析期间（YYYY-MM / YYYYMM / YYYY/MM / 完整日期）→ 当月 1 日
pub fn parse_period(value: &str) -> Option<NaiveDate> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(&format!("{}-01", v), "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}/01", v), "%Y/%m/%d"))
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}01", v), "%Y%m%d"))
        .ok()
        .or_else(|| parse_date(v))
        .map(first_of_month)
}
