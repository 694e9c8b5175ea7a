use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum MangaStatus {
    Ongoing,
    Completed,
    #[default]
    Unknown,
}

impl MangaStatus {
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Đang tiến hành" => Self::Ongoing,
            "Trọn bộ" => Self::Completed,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Manga {
    /// 不含域名的路径，例如 `/truyen-tranh/abc/`
    pub url: String,
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub genres: Vec<String>,
    pub thumbnail_url: Option<String>,
    pub status: MangaStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chapter {
    pub url: String,
    pub name: String,
    /// 毫秒时间戳，无法解析时为 0
    pub date_upload: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MangaPage {
    pub mangas: Vec<Manga>,
    pub has_next_page: bool,
}

/// `admin-ajax.php?action=searchtax` 的响应
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<SearchEntry>,
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchEntry {
    #[serde(default)]
    pub cstatus: String,
    pub img: String,
    #[serde(default)]
    pub isocm: i32,
    pub link: String,
    #[serde(default)]
    pub star: f32,
    pub title: String,
    #[serde(default)]
    pub vote: String,
}
