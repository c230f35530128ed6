//! # 配置管理模块
//!
//! 处理应用配置加载、环境变量覆盖和验证

mod app_config;
mod database;

pub use app_config::{AppConfig, BillingConfig, ServerConfig};
pub use database::DatabaseConfig;

use crate::error::{BridgeError, Result};
use crate::{
    ldebug, linfo,
    logging::{LogComponent, LogStage},
};
use std::env;
use std::path::{Path, PathBuf};

/// 环境变量覆盖前缀
const ENV_PREFIX: &str = "QUOTA_BRIDGE_";

/// 加载配置
///
/// 优先使用显式路径，其次 `QUOTA_BRIDGE_CONFIG_PATH`，最后 `config/config.{RUST_ENV}.toml`。
/// 显式指定的文件不存在时报错，默认文件不存在时使用内置默认值。
pub fn load_config(explicit_path: Option<&Path>) -> Result<AppConfig> {
    let configured = explicit_path
        .map(Path::to_path_buf)
        .or_else(|| env::var(format!("{ENV_PREFIX}CONFIG_PATH")).ok().map(PathBuf::from));

    let mut config = match configured {
        Some(path) => load_config_file(&path)?,
        None => {
            let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
            let default_file = PathBuf::from(format!("config/config.{env_name}.toml"));
            if default_file.exists() {
                load_config_file(&default_file)?
            } else {
                linfo!(
                    "system",
                    LogStage::Startup,
                    LogComponent::Configuration,
                    "use_default_config",
                    &format!("配置文件不存在，使用默认配置: {}", default_file.display())
                );
                AppConfig::default()
            }
        }
    };

    let overrides: Vec<(String, String)> = env::vars()
        .filter_map(|(key, value)| {
            key.strip_prefix(ENV_PREFIX)
                .map(|suffix| (suffix.to_lowercase(), value))
        })
        .collect();
    apply_env_overrides(&mut config, &overrides)?;

    config.validate()?;
    Ok(config)
}

/// 加载配置文件
fn load_config_file(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Err(BridgeError::config(format!(
            "配置文件不存在: {}",
            path.display()
        )));
    }

    let config_content = std::fs::read_to_string(path).map_err(|e| {
        BridgeError::config_with_source(format!("读取配置文件失败: {}", path.display()), e)
    })?;

    let config: AppConfig = toml::from_str(&config_content).map_err(|e| {
        BridgeError::config_with_source(
            format!("TOML解析失败 - 配置文件: {}, 详细错误: {e}", path.display()),
            e,
        )
    })?;

    Ok(config)
}

/// 应用环境变量覆盖，键为去掉前缀后的小写变量名
fn apply_env_overrides(config: &mut AppConfig, overrides: &[(String, String)]) -> Result<()> {
    for (key, value) in overrides {
        ldebug!(
            "system",
            LogStage::Startup,
            LogComponent::Configuration,
            "apply_env_override",
            &format!("应用环境变量覆盖: {key}")
        );

        match key.as_str() {
            "database_url" => config.database.url.clone_from(value),
            "database_max_connections" => {
                config.database.max_connections = parse_override(key, value)?;
            }
            "bind_address" => config.server.bind_address.clone_from(value),
            "port" => config.server.port = parse_override(key, value)?,
            "new_user_quota" => config.billing.new_user_quota = parse_override(key, value)?,
            "quota_per_unit" => config.billing.quota_per_unit = parse_override(key, value)?,
            _ => {}
        }
    }
    Ok(())
}

fn parse_override<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse().map_err(|e| {
        BridgeError::config_with_source(format!("无效的环境变量 {ENV_PREFIX}{}: {value}", key.to_uppercase()), e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.billing.quota_per_unit, 500_000);
        assert_eq!(config.billing.default_token_ttl_days, 365);
        assert_eq!(config.billing.capacity_model_limit, 8);
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[billing]\nnew_user_quota = 100000\n\n[server]\nport = 8088"
        )
        .unwrap();

        let config = load_config_file(file.path()).unwrap();
        assert_eq!(config.billing.new_user_quota, 100_000);
        assert_eq!(config.billing.quota_per_unit, 500_000);
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.bind_address, "127.0.0.1");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = load_config_file(Path::new("/nonexistent/quota-bridge.toml")).unwrap_err();
        assert!(matches!(err, BridgeError::Config { .. }));
    }

    #[test]
    fn test_env_overrides_apply_and_validate() {
        let mut config = AppConfig::default();
        let overrides = vec![
            ("database_url".to_string(), "sqlite::memory:".to_string()),
            ("port".to_string(), "7000".to_string()),
            ("new_user_quota".to_string(), "42".to_string()),
        ];
        apply_env_overrides(&mut config, &overrides).unwrap();
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.billing.new_user_quota, 42);

        let bad = vec![("port".to_string(), "not-a-port".to_string())];
        assert!(apply_env_overrides(&mut config, &bad).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_billing() {
        let mut config = AppConfig::default();
        config.billing.quota_per_unit = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.billing.group_ratio = -1.0;
        assert!(config.validate().is_err());
    }
}
