//! Selectel driver implementation / Selectel驱动实现
//!
//! Adapts the raw storage client onto the generic driver contract. Auth
//! timing lives here: every public method goes through `authorize`, which
//! reuses the cached token while it is still good for at least
//! `EXPIRY_SLACK_SECS` and re-authenticates otherwise. Concurrent renewals
//! may race; the last writer wins and every issued token stays valid on the
//! provider side until its own expiry.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;

use crate::storage::{Capability, Entry, StorageDriver};
use crate::utils::{clean_location, join_hosting_path};

use super::client::SelectelClient;
use super::config::SelectelConfig;
use super::types::*;

/// Renew the token when it expires within this window / 令牌续期宽限窗口
const EXPIRY_SLACK_SECS: i64 = 60;

/// Default signed-URL lifetime / 签名URL默认有效期
const DEFAULT_SIGNED_URL_EXPIRY: u64 = 600;

/// Single PUT object ceiling on the provider side / 服务端单次PUT上限
const MAX_OBJECT_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Selectel storage driver / Selectel存储驱动
pub struct SelectelDriver {
    config: SelectelConfig,
    client: SelectelClient,
    public_base: Option<url::Url>,
}

impl SelectelDriver {
    pub fn new(config: SelectelConfig) -> Result<Self, SelectelError> {
        let public_base = if config.container_url.is_empty() {
            None
        } else {
            Some(
                url::Url::parse(&config.container_url)
                    .map_err(|e| SelectelError::InvalidContainerUrl(format!("{}: {}", config.container_url, e)))?,
            )
        };
        let client = SelectelClient::new(&config.auth_url)?;
        Ok(Self { config, client, public_base })
    }

    /// Forced re-authentication / 强制重新认证
    pub async fn auth(&self) -> Result<(), SelectelError> {
        let status = self.client.auth(&self.config.login, &self.config.password).await?;
        tracing::debug!("Selectel auth renewed, status {}", status);
        Ok(())
    }

    /// Reuse the session while it is usable, renew otherwise / 会话可用则复用，否则续期
    async fn authorize(&self) -> Result<(), SelectelError> {
        if self.client.session().is_usable(EXPIRY_SLACK_SECS) {
            return Ok(());
        }
        self.auth().await
    }

    /// Account totals / 账户统计
    pub async fn account_info(&self) -> Result<AccountInfo, SelectelError> {
        self.authorize().await?;
        let raw = self.client.account_info().await?;
        if !raw.is_success() {
            return Err(api_error(&raw));
        }
        Ok(AccountInfo::from_headers(&raw.headers))
    }

    fn hosting_path(&self, location: &str) -> String {
        join_hosting_path(&self.config.container, location)
    }

    /// Probe a location: found / missing, with transport and provider
    /// failures kept distinct / 探测对象：存在、不存在与失败三态
    async fn fetch(&self, location: &str) -> Result<Option<RawResponse>, SelectelError> {
        self.authorize().await?;
        let raw = self.client.get_object(&self.hosting_path(location)).await?;
        if raw.is_success() {
            Ok(Some(raw))
        } else if raw.status == 404 {
            Ok(None)
        } else {
            Err(api_error(&raw))
        }
    }

    async fn copy_raw(&self, src_path: &str, dest_path: &str) -> Result<(), SelectelError> {
        self.authorize().await?;
        let raw = self.client.copy_object(src_path, dest_path).await?;
        if raw.is_success() {
            Ok(())
        } else {
            Err(api_error(&raw))
        }
    }

    async fn delete_raw(&self, path: &str) -> Result<(), SelectelError> {
        self.authorize().await?;
        let raw = self.client.delete_object(path).await?;
        if raw.is_success() {
            Ok(())
        } else {
            Err(api_error(&raw))
        }
    }

    /// Two-phase move: server-side copy, then delete of the source. Not
    /// atomic: when the delete phase fails the object is present at BOTH
    /// paths, and the error names the failed phase so callers can compensate.
    /// 两阶段移动：先复制后删源；删除失败时两处均存在
    pub async fn move_object(
        &self,
        src: &str,
        dest: &str,
        dest_container: Option<&str>,
    ) -> Result<String, SelectelError> {
        let dest_container = dest_container.unwrap_or(&self.config.container);
        let src_path = self.hosting_path(src);
        let dest_path = join_hosting_path(dest_container, dest);

        self.copy_raw(&src_path, &dest_path)
            .await
            .map_err(|e| SelectelError::Move { phase: MovePhase::Copy, source: Box::new(e) })?;

        self.delete_raw(&src_path)
            .await
            .map_err(|e| SelectelError::Move { phase: MovePhase::Delete, source: Box::new(e) })?;

        Ok(self.public_url(dest, Some(dest_container)))
    }

    /// Public URL from the configured container address; the port segment is
    /// omitted when the port is 80 / 公开URL，端口为80时省略端口段
    fn public_url(&self, location: &str, container: Option<&str>) -> String {
        let container = container.unwrap_or(&self.config.container);
        let location = clean_location(location);
        match &self.public_base {
            Some(base) => {
                let scheme = base.scheme();
                let host = base.host_str().unwrap_or("");
                match base.port() {
                    Some(port) if port != 80 => {
                        format!("{}://{}:{}/{}/{}", scheme, host, port, container, location)
                    }
                    _ => format!("{}://{}/{}/{}", scheme, host, container, location),
                }
            }
            None => format!("/{}/{}", container, location),
        }
    }
}

fn api_error(raw: &RawResponse) -> SelectelError {
    SelectelError::Api { status: raw.status, message: raw.text() }
}

#[async_trait]
impl StorageDriver for SelectelDriver {
    fn name(&self) -> &str {
        "Selectel"
    }

    fn capabilities(&self) -> Capability {
        Capability {
            can_server_side_copy: true,
            can_signed_url: true,
            can_archive_extract: true,
            requires_auth: true,
            max_object_size: Some(MAX_OBJECT_SIZE),
        }
    }

    async fn list(&self) -> Result<Vec<Entry>> {
        self.authorize().await?;
        let raw = self
            .client
            .list_files(&self.config.container, &FileListQuery::json())
            .await?;
        if !raw.is_success() {
            return Err(api_error(&raw).into());
        }

        let files: Vec<FileEntry> = serde_json::from_slice(&raw.body)
            .map_err(|e| anyhow!("parse file listing failed: {}", e))?;

        Ok(files
            .into_iter()
            .map(|f| {
                let is_dir = f.is_dir();
                Entry {
                    path: format!("/{}", f.name),
                    name: f.name,
                    is_dir,
                    size: f.bytes,
                    modified: if f.last_modified.is_empty() { None } else { Some(f.last_modified) },
                    content_type: if f.content_type.is_empty() { None } else { Some(f.content_type) },
                }
            })
            .collect())
    }

    async fn exists(&self, location: &str) -> Result<bool> {
        // Only the missing branch collapses to false; failures stay failures
        match self.fetch(location).await? {
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }

    async fn put(&self, location: &str, content: Bytes) -> Result<String> {
        self.authorize().await?;
        let result = self
            .client
            .upload(content, &self.hosting_path(location), &HashMap::new())
            .await?;
        if !(200..300).contains(&result.status) {
            return Err(SelectelError::Api {
                status: result.status,
                message: format!("upload of {} rejected", location),
            }
            .into());
        }
        Ok(result.url)
    }

    async fn get(&self, location: &str) -> Result<Bytes> {
        self.authorize().await?;
        let raw = self.client.get_object(&self.hosting_path(location)).await?;
        if !raw.is_success() {
            // The provider's answer is surfaced as-is, 404 included
            return Err(api_error(&raw).into());
        }
        Ok(raw.body)
    }

    async fn delete(&self, location: &str) -> Result<()> {
        self.delete_raw(&self.hosting_path(location)).await?;
        Ok(())
    }

    async fn copy_item(&self, src: &str, dest: &str) -> Result<()> {
        self.copy_raw(&self.hosting_path(src), &self.hosting_path(dest)).await?;
        Ok(())
    }

    async fn move_item(&self, src: &str, dest: &str, dest_container: Option<&str>) -> Result<String> {
        Ok(self.move_object(src, dest, dest_container).await?)
    }

    fn get_url(&self, location: &str, container: Option<&str>) -> String {
        self.public_url(location, container)
    }

    async fn get_signed_url(&self, location: &str, expiry_secs: Option<u64>) -> Result<String> {
        let expiry = expiry_secs.unwrap_or(DEFAULT_SIGNED_URL_EXPIRY);
        if !self.exists(location).await? {
            return Err(SelectelError::NotFound(location.to_string()).into());
        }
        let signed = self
            .client
            .sign_url(&self.hosting_path(location), expiry, &self.config.password)?;
        Ok(signed)
    }
}
