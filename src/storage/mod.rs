use async_trait::async_trait;
use anyhow::Result;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Configuration item definition / 配置项定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigItem {
    pub name: String,
    /// Display title (friendly name) / 显示标题
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl ConfigItem {
    pub fn new(name: &str, item_type: &str) -> Self {
        Self {
            name: name.to_string(),
            title: None,
            item_type: item_type.to_string(),
            default: None,
            options: None,
            required: false,
            help: None,
        }
    }

    pub fn title(mut self, val: &str) -> Self {
        self.title = Some(val.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default(mut self, val: &str) -> Self {
        self.default = Some(val.to_string());
        self
    }

    pub fn help(mut self, val: &str) -> Self {
        self.help = Some(val.to_string());
        self
    }

    pub fn options(mut self, val: &str) -> Self {
        self.options = Some(val.to_string());
        self
    }
}

/// Driver configuration information / 驱动配置信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    pub name: String,
    #[serde(default)]
    pub no_upload: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_root: Option<String>,
}

/// Complete driver information / 驱动完整信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverInfo {
    /// Common configuration items (mount_path, remark, etc.) / 通用配置项
    pub common: Vec<ConfigItem>,
    /// Driver-specific configuration items / 驱动特有配置项
    pub additional: Vec<ConfigItem>,
    /// Basic driver configuration / 驱动基本配置
    pub config: DriverConfig,
}

/// Generate common configuration items (defined in Core, shared by all drivers) / 生成通用配置项
pub fn get_common_items(_config: &DriverConfig) -> Vec<ConfigItem> {
    vec![
        ConfigItem::new("mount_path", "string")
            .required()
            .help("Mount path, must be unique"),
        ConfigItem::new("order", "number")
            .default("0")
            .help("Sort order"),
        ConfigItem::new("remark", "text")
            .help("Remark/Notes"),
    ]
}

/// File entry information / 文件条目信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<String>,
    pub content_type: Option<String>,
}

/// Driver capability declaration / 驱动能力声明
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capability {
    /// Support server-side copy (no download needed) / 支持服务端复制
    pub can_server_side_copy: bool,
    /// Support time-limited signed URLs / 支持限时签名直链
    pub can_signed_url: bool,
    /// Support server-side archive extraction / 支持服务端解压归档
    pub can_archive_extract: bool,
    /// Require token authentication before any call / 调用前需要令牌认证
    pub requires_auth: bool,
    /// Maximum object size for a single PUT (None means no limit) / 单次PUT最大对象大小
    pub max_object_size: Option<u64>,
}

impl Default for Capability {
    fn default() -> Self {
        Self {
            can_server_side_copy: false,
            can_signed_url: false,
            can_archive_extract: false,
            requires_auth: false,
            max_object_size: None,
        }
    }
}

/// Storage driver interface (the contract the file-abstraction layer consumes)
/// 存储驱动接口
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// Driver name / 驱动名称
    fn name(&self) -> &str;

    /// Driver capabilities / 驱动能力
    fn capabilities(&self) -> Capability;

    /// List the contents of the configured container / 列出容器内容
    async fn list(&self) -> Result<Vec<Entry>>;

    /// Whether an object exists at the location / 判断对象是否存在
    ///
    /// A missing object resolves to `Ok(false)`; transport and provider
    /// failures surface as `Err` so callers can tell the two apart.
    async fn exists(&self, location: &str) -> Result<bool>;

    /// Store an object and return its URL / 上传对象并返回其URL
    async fn put(&self, location: &str, content: Bytes) -> Result<String>;

    /// Fetch an object's content / 获取对象内容
    async fn get(&self, location: &str) -> Result<Bytes>;

    /// Delete an object / 删除对象
    async fn delete(&self, location: &str) -> Result<()>;

    /// Server-side copy within the container / 容器内服务端复制
    async fn copy_item(&self, src: &str, dest: &str) -> Result<()>;

    /// Move an object: copy then delete the source. Not atomic: the copy
    /// must fully succeed before the delete is attempted, and a failed
    /// delete leaves the object present at both paths.
    /// 移动对象：先复制后删除源，非原子操作
    async fn move_item(&self, src: &str, dest: &str, dest_container: Option<&str>) -> Result<String>;

    /// Build the public URL for a location (pure, no network call)
    /// 构建对象的公开URL（纯计算）
    fn get_url(&self, location: &str, container: Option<&str>) -> String;

    /// Build a time-limited signed URL; fails with a not-found error when
    /// the object does not exist / 构建限时签名URL
    async fn get_signed_url(&self, location: &str, expiry_secs: Option<u64>) -> Result<String>;
}

pub mod manager;

pub use manager::{StorageManager, DriverFactory, DriverBox};
