// ==========================================
// 库存消耗分析系统 - 引擎配置
// ==========================================
// 职责: 配置项定义 + 默认值 + 启动前校验
// 红线: 运行期间不可变; 校验失败时不处理任何记录
// ==========================================

use crate::engine::error::{EngineError, EngineResult};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 默认回看窗口（月）
pub const DEFAULT_LOOKBACK_MONTHS: u32 = 12;

/// 引擎配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 基准日（快照日期）
    pub as_of: NaiveDate,

    /// 回看窗口（月）
    pub lookback_months: u32,

    /// 安全库存系数
    pub safety_multiplier: Decimal,

    /// 前向分配展望期（月）
    pub horizon_months: u32,

    /// 逾期阈值（天）: 逾期天数 > 阈值 即判定逾期预留
    pub past_due_threshold_days: i64,

    /// 完工百分比下限（低于此值且有库存 → 返工候选）
    pub completion_floor: Decimal,

    /// 视为成品的产品族
    pub finished_goods_families: Vec<String>,

    /// 预测覆写上限系数
    pub forecast_cap_multiplier: Decimal,

    /// 输出数量保留小数位
    pub output_scale: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            as_of: Local::now().date_naive(),
            lookback_months: DEFAULT_LOOKBACK_MONTHS,
            safety_multiplier: dec!(1.0),
            horizon_months: 24,
            past_due_threshold_days: 0,
            completion_floor: dec!(100),
            finished_goods_families: vec!["FG".to_string()],
            forecast_cap_multiplier: dec!(1.0),
            output_scale: 4,
        }
    }
}

impl EngineConfig {
    /// 指定基准日的默认配置
    pub fn with_as_of(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            ..Self::default()
        }
    }

    /// 从 JSON 文件加载（缺失字段取默认值）
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EngineError::configuration(path.display().to_string(), format!("读取失败: {}", e))
        })?;
        let config: EngineConfig = serde_json::from_str(&raw).map_err(|e| {
            EngineError::configuration(path.display().to_string(), format!("JSON 解析失败: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 启动前校验
    pub fn validate(&self) -> EngineResult<()> {
        if self.lookback_months == 0 {
            return Err(EngineError::configuration(
                "lookback_months",
                "回看窗口必须 >= 1",
            ));
        }
        if self.horizon_months == 0 {
            return Err(EngineError::configuration(
                "horizon_months",
                "展望期必须 >= 1",
            ));
        }
        if self.safety_multiplier < Decimal::ZERO {
            return Err(EngineError::configuration(
                "safety_multiplier",
                format!("安全库存系数不能为负: {}", self.safety_multiplier),
            ));
        }
        if self.past_due_threshold_days < 0 {
            return Err(EngineError::configuration(
                "past_due_threshold_days",
                format!("逾期阈值不能为负: {}", self.past_due_threshold_days),
            ));
        }
        if self.completion_floor < Decimal::ZERO || self.completion_floor > dec!(100) {
            return Err(EngineError::configuration(
                "completion_floor",
                format!("完工下限超出范围 [0, 100]: {}", self.completion_floor),
            ));
        }
        if self.forecast_cap_multiplier <= Decimal::ZERO {
            return Err(EngineError::configuration(
                "forecast_cap_multiplier",
                format!("预测上限系数必须 > 0: {}", self.forecast_cap_multiplier),
            ));
        }
        if self.output_scale > 10 {
            return Err(EngineError::configuration(
                "output_scale",
                format!("输出小数位过大: {}", self.output_scale),
            ));
        }
        Ok(())
    }

    /// 产品族是否为成品
    pub fn is_finished_goods_family(&self, family: Option<&str>) -> bool {
        match family {
            Some(f) => self
                .finished_goods_families
                .iter()
                .any(|fg| fg.eq_ignore_ascii_case(f.trim())),
            None => false,
        }
    }
}
