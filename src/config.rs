use std::sync::LazyLock;

use anyhow::Result;
use chrono::{FixedOffset, Offset, Utc};
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;

static SITE_CONFIG_FILE: &str = "vcomycs";
static ENV_PREFIX: &str = "VCOMYCS";

static DEFAULT_BASE_URL: &str = "https://vivicomi6.info";
static DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36";

static SITE_CONFIG: LazyLock<SiteConfig> = LazyLock::new(|| {
    SiteConfig::load().unwrap_or_else(|e| {
        panic!("网站配置初始化失败: {}", e);
    })
});

pub fn get_site_config() -> &'static SiteConfig {
    &SITE_CONFIG
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    base_url: String,
    pub lang: String,
    /// 章节日期所在时区，站点使用 Asia/Ho_Chi_Minh
    pub timezone_offset_hours: i32,
    pub concurrency_limit: usize,
    #[serde(default)]
    pub rate_limit: RateLimit,
    pub user_agent: String,
}

/// 每 `secs` 秒最多 `num` 个请求，默认不限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RateLimit {
    pub num: u64,
    pub secs: u64,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            num: u64::MAX,
            secs: 1,
        }
    }
}

impl SiteConfig {
    /// 默认值 < 当前目录下的 `vcomycs.toml` < `VCOMYCS_*` 环境变量
    pub fn load() -> Result<Self> {
        Self::defaults()?
            .add_source(File::with_name(SITE_CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize::<Self>()
            .map_err(|e| anyhow::anyhow!("配置文件反序列化失败: {}", e))?
            .validated()
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Self::defaults()?
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize::<Self>()
            .map_err(|e| anyhow::anyhow!("配置反序列化失败: {}", e))?
            .validated()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        Ok(config::Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("lang", "vi")?
            .set_default("timezone_offset_hours", 7_i64)?
            .set_default("concurrency_limit", 4_i64)?
            .set_default("user_agent", DEFAULT_USER_AGENT)?)
    }

    fn validated(mut self) -> Result<Self> {
        self.base_url = self.base_url.trim().trim_end_matches('/').to_owned();
        url::Url::parse(&self.base_url)
            .map_err(|e| anyhow::anyhow!("base_url '{}' 无效: {}", self.base_url, e))?;
        if offset_seconds(self.timezone_offset_hours).is_none() {
            anyhow::bail!("时区偏移 {} 超出范围", self.timezone_offset_hours);
        }
        if self.concurrency_limit == 0 {
            anyhow::bail!("concurrency_limit 必须大于 0");
        }
        if self.rate_limit.num == 0 || self.rate_limit.secs == 0 {
            anyhow::bail!("rate_limit 的 num 和 secs 必须大于 0");
        }
        Ok(self)
    }

    /// 不含结尾 `/`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn timezone(&self) -> FixedOffset {
        offset_seconds(self.timezone_offset_hours).unwrap_or_else(|| Utc.fix())
    }
}

fn offset_seconds(hours: i32) -> Option<FixedOffset> {
    hours.checked_mul(3600).and_then(FixedOffset::east_opt)
}
