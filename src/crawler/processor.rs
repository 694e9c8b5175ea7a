use std::path::PathBuf;

use anyhow::Result;
use bytes::Bytes;
use tokio::fs;
use tracing::{info, instrument};

/// 把章节图片按页码写入目录
#[derive(Clone)]
pub struct Processor {
    chapter_dir: PathBuf,
}

impl Processor {
    pub fn new(chapter_dir: PathBuf) -> Self {
        Self { chapter_dir }
    }

    pub async fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.chapter_dir).await?;
        Ok(())
    }

    pub fn page_filename(index: usize, extension: &str) -> String {
        format!("{:03}.{}", index + 1, extension)
    }

    #[instrument(skip(self, image_bytes))]
    pub async fn write_page(&self, index: usize, image_bytes: Bytes, extension: String) -> Result<String> {
        let filename = Self::page_filename(index, &extension);
        let image_path = self.chapter_dir.join(&filename);
        fs::write(&image_path, &image_bytes).await?;
        info!("第 {} 页已保存到: {}", index + 1, image_path.display());
        Ok(filename)
    }
}

/// 由章节路径生成目录名，例如 `/truyen-tranh/abc/chap-1/` -> `vcomycs_abc_chap-1`
pub fn chapter_dir_name(chapter_url: &str) -> String {
    let path = super::parser::url_without_domain(chapter_url);
    let slug: Vec<&str> = path
        .split(['/', '?', '#'])
        .filter(|s| !s.is_empty() && *s != "truyen-tranh")
        .collect();

    let slug = slug
        .join("_")
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect::<String>();

    if slug.is_empty() {
        "vcomycs_chapter".to_owned()
    } else {
        format!("vcomycs_{}", slug)
    }
}
