//! Selectel驱动配置

use serde::{Deserialize, Serialize};

/// Selectel storage configuration / Selectel存储配置
///
/// Supplied once by the hosting layer and immutable for the driver's
/// lifetime. `container_url` is the public (CDN) address the container is
/// reachable at; its scheme, host and port feed `get_url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectelConfig {
    /// Account number / 账号
    #[serde(default)]
    pub login: String,

    /// Storage password / 存储密码
    #[serde(default)]
    pub password: String,

    /// Container holding the objects / 存放对象的容器
    #[serde(default)]
    pub container: String,

    /// Public container URL (scheme://host[:port]) / 容器公开地址
    #[serde(default)]
    pub container_url: String,

    /// Authentication endpoint / 认证端点
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
}

fn default_auth_url() -> String {
    "https://auth.selcdn.ru/".to_string()
}

impl Default for SelectelConfig {
    fn default() -> Self {
        Self {
            login: String::new(),
            password: String::new(),
            container: String::new(),
            container_url: String::new(),
            auth_url: default_auth_url(),
        }
    }
}
