// ==========================================
// 库存消耗分析系统 - 配置层
// ==========================================
// 职责: 引擎配置定义与加载（JSON 文件 / config_kv 表）
// 红线: 配置在运行开始时加载一次, 运行期间不可变
// ==========================================

pub mod config_manager;
pub mod engine_config;

// 重导出核心配置
pub use config_manager::{config_keys, ConfigManager};
pub use engine_config::{EngineConfig, DEFAULT_LOOKBACK_MONTHS};

use crate::engine::error::{EngineError, EngineResult};
use std::path::Path;

/// 按扩展名加载配置: .json → JSON 文件; .db / .sqlite → config_kv 表; 缺省 → 默认值
pub fn load_config(path: Option<&Path>) -> EngineResult<EngineConfig> {
    let Some(path) = path else {
        let config = EngineConfig::default();
        config.validate()?;
        return Ok(config);
    };

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "json" => EngineConfig::from_json_file(path),
        "db" | "sqlite" | "sqlite3" => {
            if !path.is_file() {
                return Err(EngineError::configuration(
                    path.display().to_string(),
                    "配置库不存在",
                ));
            }
            ConfigManager::new(&path.to_string_lossy())?.load_engine_config()
        }
        other => Err(EngineError::configuration(
            path.display().to_string(),
            format!("不支持的配置文件类型: {}", other),
        )),
    }
}
