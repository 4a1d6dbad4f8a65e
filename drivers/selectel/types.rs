//! Selectel data type definitions / Selectel数据类型定义

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

/// Typed failures of the Selectel layers / Selectel各层的类型化错误
#[derive(Debug, thiserror::Error)]
pub enum SelectelError {
    /// Network/HTTP layer failure, propagated verbatim / 传输层错误，原样传递
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Operation attempted before a successful auth / 未认证就发起操作
    #[error("not authenticated: call auth before storage operations")]
    NotAuthenticated,

    /// Provider answered with a non-success status / 服务端返回非成功状态
    #[error("storage api returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Raised only on the signed-URL path / 仅在签名URL路径抛出
    #[error("file not found: {0}")]
    NotFound(String),

    /// Two-phase move stopped; `phase` names the step that failed / 两阶段移动中断
    #[error("move failed during {phase:?} phase: {source}")]
    Move {
        phase: MovePhase,
        #[source]
        source: Box<SelectelError>,
    },

    #[error("url signing failed: {0}")]
    Signing(String),

    #[error("invalid container url: {0}")]
    InvalidContainerUrl(String),
}

impl SelectelError {
    /// Status code equivalent, mirroring the provider's numbering where one
    /// exists. The precondition failure maps to 499 (client closed/cancelled).
    /// 映射到等效状态码，未认证为499
    pub fn status(&self) -> Option<u16> {
        match self {
            SelectelError::NotAuthenticated => Some(499),
            SelectelError::Api { status, .. } => Some(*status),
            SelectelError::NotFound(_) => Some(404),
            SelectelError::Move { source, .. } => source.status(),
            _ => None,
        }
    }
}

/// Which step of a move completed or failed / 移动操作的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePhase {
    /// Server-side copy to the destination / 服务端复制到目标
    Copy,
    /// Delete of the source object / 删除源对象
    Delete,
}

/// Session issued by the auth endpoint / 认证端点颁发的会话
///
/// Owned exclusively by the client; mutated only by `auth`; never persisted.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub storage_url: String,
    pub auth_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Non-empty url and token, the bare precondition for any storage call
    /// 存储调用的基本前提：url与令牌非空
    pub fn is_established(&self) -> bool {
        !self.storage_url.is_empty() && !self.auth_token.is_empty()
    }

    /// Established and not expiring within `slack_secs` / 已建立且在宽限期内不过期
    pub fn is_usable(&self, slack_secs: i64) -> bool {
        if !self.is_established() {
            return false;
        }
        match self.expires_at {
            Some(at) => (at - Utc::now()).num_seconds() > slack_secs,
            None => false,
        }
    }
}

/// Raw provider response: status + headers + body / 原始响应
///
/// Status codes are left uninterpreted here; the driver adapter decides what
/// they mean.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: bytes::Bytes,
}

impl RawResponse {
    pub async fn read(resp: reqwest::Response) -> Result<Self, SelectelError> {
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?;
        Ok(Self { status, headers, body })
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Upload outcome: where the object landed and how the provider answered
/// 上传结果：对象URL与状态码
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub url: String,
    pub status: u16,
}

/// Container visibility type / 容器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerType {
    Public,
    Private,
    Gallery,
}

impl ContainerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerType::Public => "public",
            ContainerType::Private => "private",
            ContainerType::Gallery => "gallery",
        }
    }
}

impl Default for ContainerType {
    fn default() -> Self {
        ContainerType::Private
    }
}

/// Server-side archive format / 服务端归档格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Tar,
    TarGz,
    TarBz2,
}

impl ArchiveFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::TarBz2 => "tar.bz2",
        }
    }
}

/// Listing response format / 列表响应格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFormat {
    Json,
    Xml,
}

impl ListFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListFormat::Json => "json",
            ListFormat::Xml => "xml",
        }
    }
}

/// Options for the container listing / 容器列表选项
///
/// Each field is appended to the query string only when present, in stable
/// field order (format, limit, marker).
#[derive(Debug, Clone, Default)]
pub struct ContainerListQuery {
    pub format: Option<ListFormat>,
    /// Maximum number of entries (server default 10 000) / 最大条目数
    pub limit: Option<u32>,
    /// Name of the final container of the previous page / 上一页最后的容器名
    pub marker: Option<String>,
}

impl ContainerListQuery {
    pub fn to_query_string(&self) -> String {
        let mut pairs: Vec<String> = Vec::new();
        if let Some(format) = self.format {
            pairs.push(format!("format={}", format.as_str()));
        }
        if let Some(limit) = self.limit {
            pairs.push(format!("limit={}", limit));
        }
        if let Some(marker) = &self.marker {
            pairs.push(format!("marker={}", urlencoding::encode(marker)));
        }
        pairs.join("&")
    }
}

/// Options for the object listing / 对象列表选项
///
/// Stable field order: format, limit, marker, prefix, path, delimiter.
#[derive(Debug, Clone, Default)]
pub struct FileListQuery {
    pub format: Option<ListFormat>,
    pub limit: Option<u32>,
    /// Objects whose name exceeds the marker / 名称大于marker的对象
    pub marker: Option<String>,
    /// Only objects whose names start with the prefix / 仅匹配前缀的对象
    pub prefix: Option<String>,
    /// Objects in the given virtual folder / 指定虚拟目录下的对象
    pub path: Option<String>,
    /// Roll up object names at the delimiter / 按分隔符聚合对象名
    pub delimiter: Option<char>,
}

impl FileListQuery {
    pub fn json() -> Self {
        Self { format: Some(ListFormat::Json), ..Default::default() }
    }

    pub fn to_query_string(&self) -> String {
        let mut pairs: Vec<String> = Vec::new();
        if let Some(format) = self.format {
            pairs.push(format!("format={}", format.as_str()));
        }
        if let Some(limit) = self.limit {
            pairs.push(format!("limit={}", limit));
        }
        if let Some(marker) = &self.marker {
            pairs.push(format!("marker={}", urlencoding::encode(marker)));
        }
        if let Some(prefix) = &self.prefix {
            pairs.push(format!("prefix={}", urlencoding::encode(prefix)));
        }
        if let Some(path) = &self.path {
            pairs.push(format!("path={}", urlencoding::encode(path)));
        }
        if let Some(delimiter) = self.delimiter {
            pairs.push(format!("delimiter={}", urlencoding::encode(&delimiter.to_string())));
        }
        pairs.join("&")
    }
}

/// Object descriptor in a JSON listing / JSON列表中的对象描述
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct FileEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bytes: u64,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub last_modified: String,
}

impl FileEntry {
    pub fn is_dir(&self) -> bool {
        self.content_type == "application/directory"
    }
}

/// Container descriptor in a JSON listing / JSON列表中的容器描述
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ContainerEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub bytes: u64,
    #[serde(default, rename = "type")]
    pub container_type: String,
}

/// Account totals from the X-Account-* headers / 账户统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountInfo {
    pub container_count: u64,
    pub object_count: u64,
    pub bytes_used: u64,
    pub bytes_downloaded: u64,
}

impl AccountInfo {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            container_count: header_u64(headers, "x-account-container-count"),
            object_count: header_u64(headers, "x-account-object-count"),
            bytes_used: header_u64(headers, "x-account-bytes-used"),
            bytes_downloaded: header_u64(headers, "x-transfered-bytes"),
        }
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> u64 {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}
