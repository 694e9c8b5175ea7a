use std::sync::LazyLock;

use anyhow::Result;
use chrono::{FixedOffset, NaiveDate, TimeZone};
use scraper::{Element, ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::SiteConfig;
use crate::models::{Chapter, Manga, MangaPage, MangaStatus, SearchResponse};
use crate::pages::{self, ResolvedPage};

macro_rules! selector {
    ($name:ident, $css:literal) => {
        static $name: LazyLock<Selector> =
            LazyLock::new(|| Selector::parse($css).expect(concat!("无法创建选择器: ", $css)));
    };
}

selector!(POPULAR_ITEM, ".comic-list .comic-item:not(.grayscale-img)");
selector!(POPULAR_LINK, ".comic-title-link a");
selector!(POPULAR_TITLE, ".comic-title");
selector!(THUMBNAIL, ".img-thumbnail");
selector!(NEXT_PAGE, "li.next:not(.disabled)");
selector!(DETAILS_TITLE, ".info-title");
selector!(INFO_LABEL, ".comic-info strong");
selector!(DESCRIPTION, ".intro-container .text-justify");
selector!(GENRE, ".comic-info .tags a");
selector!(CHAPTER_ROW, ".chapter-table table tbody tr");
selector!(ANCHOR, "a");
selector!(CHAPTER_NAME, "a .hidden-sm");
selector!(CELL, "td");

const AUTHOR_LABEL: &str = "Tác giả";
const STATUS_LABEL: &str = "Tình trạng";
const READ_MORE: &str = "— Xem Thêm —";
const CHAPTER_DATE_FORMAT: &str = "%d/%m/%y";

#[derive(Clone)]
pub struct Parser {
    base: Url,
    timezone: FixedOffset,
}

impl Parser {
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let base = Url::parse(&format!("{}/", config.base_url()))?;
        Ok(Self {
            base,
            timezone: config.timezone(),
        })
    }
}

impl Parser {
    #[instrument(skip_all)]
    pub fn popular(&self, html: &str) -> MangaPage {
        let document = Html::parse_document(html);

        let mangas: Vec<Manga> = document
            .select(&POPULAR_ITEM)
            .filter_map(|item| {
                let href = item.select(&POPULAR_LINK).next()?.value().attr("href")?;
                Some(Manga {
                    url: url_without_domain(href),
                    title: text_of(item, &POPULAR_TITLE).trim().to_owned(),
                    thumbnail_url: self.thumbnail(item),
                    ..Default::default()
                })
            })
            .collect();

        let has_next_page = document.select(&NEXT_PAGE).next().is_some();
        info!("解析到 {} 部漫画, 是否有下一页: {}", mangas.len(), has_next_page);
        MangaPage {
            mangas,
            has_next_page,
        }
    }

    #[instrument(skip_all)]
    pub fn search(&self, json: &str) -> Result<MangaPage> {
        let response: SearchResponse = serde_json::from_str(json)
            .map_err(|e| anyhow::anyhow!("搜索结果反序列化失败: {}", e))?;

        if !response.success {
            warn!("搜索接口返回失败");
            return Ok(MangaPage::default());
        }

        let mangas = response
            .data
            .into_iter()
            .map(|entry| Manga {
                url: url_without_domain(&entry.link),
                title: entry.title,
                thumbnail_url: Some(entry.img).filter(|img| !img.is_empty()),
                ..Default::default()
            })
            .collect();

        Ok(MangaPage {
            mangas,
            has_next_page: false,
        })
    }

    #[instrument(skip_all)]
    pub fn manga_details(&self, html: &str, url: &str) -> Result<Manga> {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let title = normalize_whitespace(&text_of(root, &DETAILS_TITLE));
        if title.is_empty() {
            anyhow::bail!("无法提取漫画标题");
        }

        let author = labelled_value(root, AUTHOR_LABEL).filter(|a| !a.is_empty());

        let description = document
            .select(&DESCRIPTION)
            .next()
            .map(|e| normalize_whitespace(&e.text().collect::<String>()))
            .map(|d| match d.find(READ_MORE) {
                Some(pos) => d[..pos].trim_end().to_owned(),
                None => d,
            })
            .filter(|d| !d.is_empty());

        let genres = document
            .select(&GENRE)
            .map(|tag| title_case(&normalize_whitespace(&tag.text().collect::<String>())))
            .filter(|g| !g.is_empty())
            .collect();

        let status = labelled_value(root, STATUS_LABEL)
            .map(|s| MangaStatus::from_label(&s))
            .unwrap_or_default();

        let manga = Manga {
            url: url_without_domain(url),
            title,
            author,
            description,
            genres,
            thumbnail_url: self.thumbnail(root),
            status,
        };
        debug!("漫画详情: {:?}", manga);
        Ok(manga)
    }

    #[instrument(skip_all)]
    pub fn chapters(&self, html: &str) -> Vec<Chapter> {
        let document = Html::parse_document(html);

        let chapters: Vec<Chapter> = document
            .select(&CHAPTER_ROW)
            .filter_map(|row| {
                let href = row.select(&ANCHOR).next()?.value().attr("href")?;
                let date_upload = row
                    .select(&CELL)
                    .last()
                    .map(|cell| self.parse_date(&cell.text().collect::<String>()))
                    .unwrap_or(0);

                Some(Chapter {
                    url: url_without_domain(href),
                    name: normalize_whitespace(&text_of(row, &CHAPTER_NAME)),
                    date_upload,
                })
            })
            .collect();

        info!("解析到 {} 个章节", chapters.len());
        chapters
    }

    /// 章节页面 -> 图片地址
    pub fn page_list(&self, html: &str, chapter_url: &str) -> Result<Vec<ResolvedPage>> {
        let chapter_url = self.base.join(chapter_url)?;
        Ok(pages::page_list(html, Some(&chapter_url))?)
    }

    /// `dd/MM/yy`，按站点时区的零点计算毫秒时间戳
    pub fn parse_date(&self, text: &str) -> i64 {
        NaiveDate::parse_from_str(text.trim(), CHAPTER_DATE_FORMAT)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .and_then(|datetime| self.timezone.from_local_datetime(&datetime).single())
            .map(|datetime| datetime.timestamp_millis())
            .unwrap_or(0)
    }

    fn thumbnail(&self, element: ElementRef) -> Option<String> {
        let src = element.select(&THUMBNAIL).next()?.value().attr("src")?;
        self.base.join(src.trim()).ok().map(String::from)
    }
}

/// 去掉协议和域名，只保留路径、查询和片段
pub fn url_without_domain(href: &str) -> String {
    match Url::parse(href) {
        Ok(url) => {
            let mut path = url.path().to_owned();
            if let Some(query) = url.query() {
                path.push('?');
                path.push_str(query);
            }
            if let Some(fragment) = url.fragment() {
                path.push('#');
                path.push_str(fragment);
            }
            path
        }
        Err(_) => href.to_owned(),
    }
}

fn text_of(element: ElementRef, selector: &Selector) -> String {
    element
        .select(selector)
        .flat_map(|e| e.text())
        .collect::<String>()
}

/// `<strong>标签</strong><span>值</span>` 形式的信息栏
fn labelled_value(root: ElementRef, label: &str) -> Option<String> {
    root.select(&INFO_LABEL)
        .filter(|strong| strong.text().any(|t| t.contains(label)))
        .find_map(|strong| strong.next_sibling_element())
        .filter(|sibling| sibling.value().name() == "span")
        .map(|span| normalize_whitespace(&span.text().collect::<String>()))
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
