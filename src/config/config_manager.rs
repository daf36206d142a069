// ==========================================
// 库存消耗分析系统 - 配置管理器
// ==========================================
// 职责: 从 config_kv 表加载引擎配置（缺失键取默认值）
// 存储: config_kv 表 (scope_id + key + value)
// ==========================================

use crate::config::engine_config::EngineConfig;
use crate::db::open_sqlite_connection;
use crate::engine::error::{EngineError, EngineResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// 配置键
pub mod config_keys {
    pub const AS_OF: &str = "as_of";
    pub const LOOKBACK_MONTHS: &str = "lookback_months";
    pub const SAFETY_MULTIPLIER: &str = "safety_multiplier";
    pub const HORIZON_MONTHS: &str = "horizon_months";
    pub const PAST_DUE_THRESHOLD_DAYS: &str = "past_due_threshold_days";
    pub const COMPLETION_FLOOR: &str = "completion_floor";
    /// 逗号分隔
    pub const FINISHED_GOODS_FAMILIES: &str = "finished_goods_families";
    pub const FORECAST_CAP_MULTIPLIER: &str = "forecast_cap_multiplier";
    pub const OUTPUT_SCALE: &str = "output_scale";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> EngineResult<Self> {
        let conn = open_sqlite_connection(db_path).map_err(|e| {
            EngineError::configuration(db_path, format!("数据库打开失败: {}", e))
        })?;

        let manager = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        manager.ensure_schema()?;
        Ok(manager)
    }

    fn lock(&self) -> EngineResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| EngineError::configuration("config_kv", format!("锁获取失败: {}", e)))
    }

    /// 建表（幂等）
    fn ensure_schema(&self) -> EngineResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS config_kv (
                scope_id TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (scope_id, key)
            );",
        )
        .map_err(|e| EngineError::configuration("config_kv", e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    pub fn get_config_value(&self, key: &str) -> EngineResult<Option<String>> {
        let conn = self.lock()?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(EngineError::configuration(key, e.to_string())),
        }
    }

    /// 写入 global 配置（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> EngineResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )
        .map_err(|e| EngineError::configuration(key, e.to_string()))?;
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON 格式, 按键排序）
    pub fn get_config_snapshot(&self) -> EngineResult<String> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")
            .map_err(|e| EngineError::configuration("config_kv", e.to_string()))?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(|e| EngineError::configuration("config_kv", e.to_string()))?;

        let mut config_map = BTreeMap::new();
        for row in rows {
            let (key, value) = row.map_err(|e| EngineError::configuration("config_kv", e.to_string()))?;
            config_map.insert(key, value);
        }

        Ok(json!(config_map).to_string())
    }

    /// 加载完整引擎配置并校验
    pub fn load_engine_config(&self) -> EngineResult<EngineConfig> {
        let mut config = EngineConfig::default();

        if let Some(v) = self.get_config_value(config_keys::AS_OF)? {
            config.as_of = parse_value(config_keys::AS_OF, &v, |s| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
            })?;
        }
        if let Some(v) = self.get_config_value(config_keys::LOOKBACK_MONTHS)? {
            config.lookback_months = parse_value(config_keys::LOOKBACK_MONTHS, &v, |s| s.parse().ok())?;
        }
        if let Some(v) = self.get_config_value(config_keys::SAFETY_MULTIPLIER)? {
            config.safety_multiplier =
                parse_value(config_keys::SAFETY_MULTIPLIER, &v, |s| Decimal::from_str(s).ok())?;
        }
        if let Some(v) = self.get_config_value(config_keys::HORIZON_MONTHS)? {
            config.horizon_months = parse_value(config_keys::HORIZON_MONTHS, &v, |s| s.parse().ok())?;
        }
        if let Some(v) = self.get_config_value(config_keys::PAST_DUE_THRESHOLD_DAYS)? {
            config.past_due_threshold_days =
                parse_value(config_keys::PAST_DUE_THRESHOLD_DAYS, &v, |s| s.parse().ok())?;
        }
        if let Some(v) = self.get_config_value(config_keys::COMPLETION_FLOOR)? {
            config.completion_floor =
                parse_value(config_keys::COMPLETION_FLOOR, &v, |s| Decimal::from_str(s).ok())?;
        }
        if let Some(v) = self.get_config_value(config_keys::FINISHED_GOODS_FAMILIES)? {
            config.finished_goods_families = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(v) = self.get_config_value(config_keys::FORECAST_CAP_MULTIPLIER)? {
            config.forecast_cap_multiplier =
                parse_value(config_keys::FORECAST_CAP_MULTIPLIER, &v, |s| Decimal::from_str(s).ok())?;
        }
        if let Some(v) = self.get_config_value(config_keys::OUTPUT_SCALE)? {
            config.output_scale = parse_value(config_keys::OUTPUT_SCALE, &v, |s| s.parse().ok())?;
        }

        config.validate()?;
        debug!(as_of = %config.as_of, horizon = config.horizon_months, "引擎配置加载完成");
        Ok(config)
    }
}

/// 解析单个配置值, 失败即 ConfigurationError
fn parse_value<T, F>(key: &str, raw: &str, parse: F) -> EngineResult<T>
where
    F: FnOnce(&str) -> Option<T>,
{
    parse(raw.trim()).ok_or_else(|| {
        EngineError::configuration(key, format!("配置值格式错误: {}", raw))
    })
}
