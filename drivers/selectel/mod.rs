//! Selectel cloud storage driver / Selectel云存储驱动
//!
//! Container/object storage behind the Selectel REST API
//! 基于Selectel REST API的容器/对象存储
//!
//! Architecture principles / 架构原则:
//! - Client only issues raw requests, one per operation / 客户端只发原始请求
//! - Driver owns auth timing and response interpretation / 驱动负责认证时机与响应解释
//! - Session token is short-lived and renewed with expiry slack / 令牌短期有效，按过期时间续期

pub mod config;
pub mod types;
pub mod client;
pub mod driver;
pub mod factory;

#[cfg(test)]
pub mod mock;

pub use config::SelectelConfig;
pub use client::SelectelClient;
pub use driver::SelectelDriver;
pub use factory::SelectelDriverFactory;
pub use types::{SelectelError, MovePhase};
