use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use tracing::{debug, instrument};

use super::limiter::RateLimiter;
use crate::config::SiteConfig;

static SEARCH_ENDPOINT: &str = "wp-admin/admin-ajax.php";

#[derive(Clone)]
pub struct Downloader {
    client: Client,
    config: SiteConfig,
    limiter: Arc<RateLimiter>,
}

impl Downloader {
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            REFERER,
            HeaderValue::from_str(&format!("{}/", config.base_url()))?,
        );

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            limiter: Arc::new(RateLimiter::from_config(config.rate_limit)),
        })
    }

    /// 接受站内路径或绝对地址
    pub fn absolute_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_owned()
        } else {
            self.config.url(url)
        }
    }

    #[instrument(skip(self))]
    pub async fn html(&self, url: &str) -> Result<String> {
        let url = self.absolute_url(url);
        debug!("GET {}", url);
        self.limiter.acquire().await;
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("请求失败 {}: {}", url, e))?
            .error_for_status()?;
        Ok(response.text().await?)
    }

    pub async fn popular(&self, page: u32) -> Result<String> {
        self.html(&format!("/page/{}/", page)).await
    }

    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<String> {
        let url = self.config.url(SEARCH_ENDPOINT);
        self.limiter.acquire().await;
        let response = self
            .client
            .post(&url)
            .form(&[("action", "searchtax"), ("keyword", query)])
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("搜索请求失败: {}", e))?
            .error_for_status()?;
        Ok(response.text().await?)
    }

    /// 返回图片内容和扩展名
    #[instrument(skip(self))]
    pub async fn image(&self, image_url: &str) -> Result<(Bytes, String)> {
        self.limiter.acquire().await;
        let response = self
            .client
            .get(image_url)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("下载失败 {}: {}", image_url, e))?
            .error_for_status()?;
        let image_bytes = response
            .bytes()
            .await
            .map_err(|e| anyhow::anyhow!("读取响应失败 {}: {}", image_url, e))?;

        Ok((image_bytes, image_extension(image_url)))
    }
}

fn image_extension(image_url: &str) -> String {
    let path = url::Url::parse(image_url)
        .map(|url| url.path().to_owned())
        .unwrap_or_else(|_| image_url.to_owned());

    Path::new(&path)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 4)
        .unwrap_or("jpg")
        .to_ascii_lowercase()
}
