pub mod downloader;
pub mod limiter;
pub mod parser;
pub mod processor;
pub mod task;

pub use task::TaskManager;

use std::path::PathBuf;

use anyhow::Result;
use tracing::{error, info, instrument};

pub use downloader::Downloader;
pub use parser::Parser;
pub use processor::Processor;

use crate::config::SiteConfig;
use crate::models::{Chapter, Manga, MangaPage};
use crate::pages::ResolvedPage;

/// 搜索时以此开头表示直接按漫画 slug 打开
pub static PREFIX_ID_SEARCH: &str = "id:";

pub struct VcomycsCrawler {
    parser: Parser,
    downloader: Downloader,
    concurrency_limit: usize,
}

impl VcomycsCrawler {
    pub fn new(config: &SiteConfig) -> Result<Self> {
        Ok(Self {
            parser: Parser::new(config)?,
            downloader: Downloader::new(config)?,
            concurrency_limit: config.concurrency_limit,
        })
    }

    pub async fn popular(&self, page: u32) -> Result<MangaPage> {
        let html = self.downloader.popular(page).await?;
        Ok(self.parser.popular(&html))
    }

    pub async fn latest(&self, _page: u32) -> Result<MangaPage> {
        anyhow::bail!("站点不支持最新更新列表")
    }

    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<MangaPage> {
        if let Some(id) = query.strip_prefix(PREFIX_ID_SEARCH) {
            let url = format!("/truyen-tranh/{}/", id.trim());
            let manga = self.manga_details(&url).await?;
            return Ok(MangaPage {
                mangas: vec![manga],
                has_next_page: false,
            });
        }

        let json = self.downloader.search(query).await?;
        self.parser.search(&json)
    }

    pub async fn manga_details(&self, url: &str) -> Result<Manga> {
        let html = self.downloader.html(url).await?;
        self.parser.manga_details(&html, url)
    }

    pub async fn chapters(&self, manga_url: &str) -> Result<Vec<Chapter>> {
        let html = self.downloader.html(manga_url).await?;
        Ok(self.parser.chapters(&html))
    }

    #[instrument(skip(self))]
    pub async fn page_list(&self, chapter_url: &str) -> Result<Vec<ResolvedPage>> {
        let html = self.downloader.html(chapter_url).await?;
        let absolute = self.downloader.absolute_url(chapter_url);
        self.parser.page_list(&html, &absolute).inspect_err(|e| {
            error!("章节 {} 解析失败: {}", chapter_url, e);
        })
    }

    /// 下载整章图片，返回保存目录
    ///
    /// 单页下载失败只记录日志，其余页面照常保存。
    #[instrument(skip(self))]
    pub async fn download_chapter(&self, chapter_url: &str) -> Result<PathBuf> {
        let pages = self.page_list(chapter_url).await?;

        let chapter_dir = PathBuf::from(processor::chapter_dir_name(chapter_url));
        let processor = Processor::new(chapter_dir.clone());
        processor.prepare().await?;

        let mut tasks = TaskManager::new(self.concurrency_limit);
        for page in pages {
            let downloader = self.downloader.clone();
            let processor = processor.clone();
            tasks.spawn(async move {
                let (image_bytes, extension) = downloader.image(&page.image_url).await?;
                processor.write_page(page.index, image_bytes, extension).await
            });
        }

        let results = tasks.wait_all().await;
        let failed = results.iter().filter(|r| r.is_err()).count();
        for e in results.iter().filter_map(|r| r.as_ref().err()) {
            error!("图片下载失败: {}", e);
        }
        info!(
            "章节下载完成: {} 页成功, {} 页失败",
            results.len() - failed,
            failed
        );

        Ok(chapter_dir)
    }
}
