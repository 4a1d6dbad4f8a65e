//! Selectel HTTP client / Selectel HTTP客户端
//!
//! One request per operation against the storage REST API. Status codes are
//! not interpreted here (the driver does that); the only local check is the
//! fail-fast precondition on an unauthenticated session.

use std::collections::HashMap;
use std::sync::RwLock;

use bytes::Bytes;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Method};
use sha1::{Digest, Sha1};

use crate::utils::encode_path;
use super::types::*;

type HmacSha1 = Hmac<Sha1>;

/// Secret-sharing header for gallery containers; its value is never sent in
/// the clear / gallery容器的密钥头，值不明文传输
pub const GALLERY_SECRET_HEADER: &str = "X-Container-Meta-Gallery-Secret";

/// SHA-1 hex transform applied to the gallery secret before transmission
/// 传输前对gallery密钥做SHA-1十六进制变换
pub fn hash_gallery_secret(value: &str) -> String {
    hex::encode(Sha1::digest(value.as_bytes()))
}

/// Selectel HTTP client / Selectel HTTP客户端
pub struct SelectelClient {
    http: Client,
    auth_url: String,
    session: RwLock<Session>,
}

impl SelectelClient {
    pub fn new(auth_url: &str) -> Result<Self, SelectelError> {
        Ok(Self {
            http: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            auth_url: auth_url.to_string(),
            session: RwLock::new(Session::default()),
        })
    }

    /// Current session snapshot / 当前会话快照
    pub fn session(&self) -> Session {
        self.session.read().unwrap().clone()
    }

    /// Fail fast when no session is established / 会话未建立时立即失败
    fn require_session(&self) -> Result<Session, SelectelError> {
        let session = self.session();
        if session.is_established() {
            Ok(session)
        } else {
            Err(SelectelError::NotAuthenticated)
        }
    }

    fn storage_base(session: &Session) -> &str {
        session.storage_url.trim_end_matches('/')
    }

    fn request(&self, method: Method, url: &str, token: &str) -> reqwest::RequestBuilder {
        self.http.request(method, url).header("X-Auth-Token", token)
    }

    /// Obtain the session token and storage endpoint / 获取会话令牌与存储端点
    ///
    /// On any non-2xx answer the HTTP error is propagated untouched; nothing
    /// is stored. No retry.
    pub async fn auth(&self, login: &str, password: &str) -> Result<u16, SelectelError> {
        tracing::debug!("Selectel auth as {}", login);
        let resp = self
            .http
            .get(&self.auth_url)
            .header("X-Auth-User", login)
            .header("X-Auth-Key", password)
            .send()
            .await?
            .error_for_status()?;

        let status = resp.status().as_u16();
        let headers = resp.headers();

        let storage_url = headers
            .get("x-storage-url")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let auth_token = headers
            .get("x-auth-token")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let expires_at = headers
            .get("x-expire-auth-token")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs));

        {
            let mut session = self.session.write().unwrap();
            *session = Session { storage_url, auth_token, expires_at };
        }

        Ok(status)
    }

    /// Account totals (HEAD on the storage root); caller reads the
    /// X-Account-* headers / 账户统计（HEAD存储根）
    pub async fn account_info(&self) -> Result<RawResponse, SelectelError> {
        let session = self.require_session()?;
        let url = Self::storage_base(&session).to_string();
        let resp = self.request(Method::HEAD, &url, &session.auth_token).send().await?;
        RawResponse::read(resp).await
    }

    /// List available containers / 列出可用容器
    pub async fn list_containers(&self, query: &ContainerListQuery) -> Result<RawResponse, SelectelError> {
        let session = self.require_session()?;
        let mut url = Self::storage_base(&session).to_string();
        let qs = query.to_query_string();
        if !qs.is_empty() {
            url.push('?');
            url.push_str(&qs);
        }
        tracing::debug!("Selectel list containers: {}", url);
        let resp = self.request(Method::GET, &url, &session.auth_token).send().await?;
        RawResponse::read(resp).await
    }

    /// Create a container / 创建容器
    pub async fn create_container(&self, name: &str, container_type: ContainerType) -> Result<RawResponse, SelectelError> {
        let session = self.require_session()?;
        let url = format!("{}/{}", Self::storage_base(&session), encode_path(name));
        let resp = self
            .request(Method::PUT, &url, &session.auth_token)
            .header("X-Container-Meta-Type", container_type.as_str())
            .send()
            .await?;
        RawResponse::read(resp).await
    }

    /// Container metadata (HEAD) / 容器元信息
    pub async fn container_info(&self, name: &str) -> Result<RawResponse, SelectelError> {
        let session = self.require_session()?;
        let url = format!("{}/{}", Self::storage_base(&session), encode_path(name));
        let resp = self.request(Method::HEAD, &url, &session.auth_token).send().await?;
        RawResponse::read(resp).await
    }

    /// Change a container's type / 修改容器类型
    pub async fn update_container(&self, name: &str, container_type: ContainerType) -> Result<RawResponse, SelectelError> {
        let session = self.require_session()?;
        let url = format!("{}/{}", Self::storage_base(&session), encode_path(name));
        let resp = self
            .request(Method::POST, &url, &session.auth_token)
            .header("X-Container-Meta-Type", container_type.as_str())
            .send()
            .await?;
        RawResponse::read(resp).await
    }

    /// Delete a container (409 from the provider when not empty) / 删除容器
    pub async fn delete_container(&self, name: &str) -> Result<RawResponse, SelectelError> {
        let session = self.require_session()?;
        let url = format!("{}/{}", Self::storage_base(&session), encode_path(name));
        let resp = self.request(Method::DELETE, &url, &session.auth_token).send().await?;
        RawResponse::read(resp).await
    }

    /// List objects in a container; the caller parses the body / 列出容器内对象
    pub async fn list_files(&self, container: &str, query: &FileListQuery) -> Result<RawResponse, SelectelError> {
        let session = self.require_session()?;
        let mut url = format!("{}/{}", Self::storage_base(&session), encode_path(container));
        let qs = query.to_query_string();
        if !qs.is_empty() {
            url.push('?');
            url.push_str(&qs);
        }
        tracing::debug!("Selectel list files: {}", url);
        let resp = self.request(Method::GET, &url, &session.auth_token).send().await?;
        RawResponse::read(resp).await
    }

    /// Upload an object / 上传对象
    ///
    /// Extra headers are copied onto the request verbatim, except the gallery
    /// secret which goes out as its SHA-1 hex digest.
    pub async fn upload(
        &self,
        data: Bytes,
        hosting_path: &str,
        extra_headers: &HashMap<String, String>,
    ) -> Result<UploadResult, SelectelError> {
        let session = self.require_session()?;
        let url = format!("{}/{}", Self::storage_base(&session), encode_path(hosting_path));
        tracing::debug!("Selectel upload: {}", url);

        let mut req = self.request(Method::PUT, &url, &session.auth_token);
        for (name, value) in extra_headers {
            if name.eq_ignore_ascii_case(GALLERY_SECRET_HEADER) {
                req = req.header(name.as_str(), hash_gallery_secret(value));
            } else {
                req = req.header(name.as_str(), value.as_str());
            }
        }

        let resp = req.body(data).send().await?;
        Ok(UploadResult { url, status: resp.status().as_u16() })
    }

    /// Stream an archive to the extract endpoint / 流式上传归档并解压
    pub async fn extract_archive<S>(
        &self,
        stream: S,
        hosting_path: &str,
        format: ArchiveFormat,
    ) -> Result<RawResponse, SelectelError>
    where
        S: futures::TryStream + Send + 'static,
        S::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
        Bytes: From<S::Ok>,
    {
        let session = self.require_session()?;
        let url = format!(
            "{}/{}?extract-archive={}",
            Self::storage_base(&session),
            encode_path(hosting_path),
            format.as_str()
        );
        tracing::debug!("Selectel extract archive: {}", url);
        let resp = self
            .request(Method::PUT, &url, &session.auth_token)
            .header("Accept", "application/json")
            .body(reqwest::Body::wrap_stream(stream))
            .send()
            .await?;
        RawResponse::read(resp).await
    }

    /// Server-side copy (COPY + Destination header, no body) / 服务端复制
    pub async fn copy_object(&self, src_path: &str, dest_path: &str) -> Result<RawResponse, SelectelError> {
        let session = self.require_session()?;
        let url = format!("{}/{}", Self::storage_base(&session), encode_path(src_path));
        let destination = format!("/{}", dest_path.trim_start_matches('/'));
        tracing::debug!("Selectel copy: {} -> {}", url, destination);
        let resp = self
            .request(Method::from_bytes(b"COPY").unwrap(), &url, &session.auth_token)
            .header("Destination", destination)
            .send()
            .await?;
        RawResponse::read(resp).await
    }

    /// Delete an object / 删除对象
    pub async fn delete_object(&self, path: &str) -> Result<RawResponse, SelectelError> {
        let session = self.require_session()?;
        let url = format!("{}/{}", Self::storage_base(&session), encode_path(path));
        let resp = self.request(Method::DELETE, &url, &session.auth_token).send().await?;
        RawResponse::read(resp).await
    }

    /// Fetch an object / 获取对象
    pub async fn get_object(&self, path: &str) -> Result<RawResponse, SelectelError> {
        let session = self.require_session()?;
        let url = format!("{}/{}", Self::storage_base(&session), encode_path(path));
        let resp = self.request(Method::GET, &url, &session.auth_token).send().await?;
        RawResponse::read(resp).await
    }

    /// Build a time-limited signed URL (temp-URL scheme: HMAC-SHA1 over
    /// "GET\n{expires}\n{path}") / 构建限时签名URL
    pub fn sign_url(&self, hosting_path: &str, expires_in_secs: u64, key: &str) -> Result<String, SelectelError> {
        let session = self.require_session()?;
        let base = url::Url::parse(&session.storage_url)
            .map_err(|e| SelectelError::Signing(e.to_string()))?;

        let mut path = base.path().trim_end_matches('/').to_string();
        path.push('/');
        path.push_str(hosting_path.trim_start_matches('/'));

        let expires = Utc::now().timestamp() + expires_in_secs as i64;
        let message = format!("GET\n{}\n{}", expires, path);

        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|e| SelectelError::Signing(e.to_string()))?;
        mac.update(message.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(format!(
            "{}{}?temp_url_sig={}&temp_url_expires={}",
            base.origin().ascii_serialization(),
            path,
            signature,
            expires
        ))
    }
}
