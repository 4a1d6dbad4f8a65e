//! Selectel驱动工厂

use anyhow::{anyhow, Result};
use serde_json::Value;

use crate::storage::{ConfigItem, DriverConfig, DriverFactory, StorageDriver};
use super::config::SelectelConfig;
use super::driver::SelectelDriver;

/// Selectel驱动工厂
pub struct SelectelDriverFactory;

impl DriverFactory for SelectelDriverFactory {
    fn driver_type(&self) -> &'static str {
        "selectel"
    }

    fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            name: "Selectel".to_string(),
            no_upload: false,
            default_root: Some("/".to_string()),
        }
    }

    fn additional_items(&self) -> Vec<ConfigItem> {
        vec![
            ConfigItem::new("login", "string")
                .title("账号")
                .help("Account number")
                .required(),
            ConfigItem::new("password", "password")
                .title("存储密码")
                .help("Storage password")
                .required(),
            ConfigItem::new("container", "string")
                .title("容器")
                .help("Container holding the objects")
                .required(),
            ConfigItem::new("container_url", "string")
                .title("容器公开地址")
                .help("Public container URL, scheme://host[:port]"),
            ConfigItem::new("auth_url", "string")
                .title("认证端点")
                .default("https://auth.selcdn.ru/"),
        ]
    }

    fn create_driver(&self, config: Value) -> Result<Box<dyn StorageDriver>> {
        let config: SelectelConfig = serde_json::from_value(config)
            .map_err(|e| anyhow!("配置解析失败: {}", e))?;
        let driver = SelectelDriver::new(config)?;
        Ok(Box::new(driver))
    }
}
