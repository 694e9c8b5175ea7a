pub mod cipher;
pub mod deobfuscate;
pub mod images;
pub mod payload;

pub use deobfuscate::decode_url;
pub use images::{RawImageRef, scan_images};
pub use payload::CipherPayload;

use scraper::Html;
use serde::Serialize;
use tracing::{info, instrument, warn};
use url::Url;

use crate::error::PageError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPage {
    pub index: usize,
    pub image_url: String,
}

/// 提取载荷和口令并解密出图片列表片段
#[instrument(skip_all)]
pub fn decrypt_fragment(document: &Html) -> Result<String, PageError> {
    let cipher_payload = payload::extract_payload(document)?;
    let passphrase = payload::extract_passphrase(document)?;
    cipher::decrypt_payload(&passphrase, &cipher_payload)
}

/// 按原顺序把图片引用转换为页面，解码失败时退回 `src`
#[instrument(skip_all)]
pub fn assemble(refs: &[RawImageRef]) -> Result<Vec<ResolvedPage>, PageError> {
    refs.iter()
        .enumerate()
        .map(|(index, image)| {
            let decoded = image
                .obfuscated
                .as_deref()
                .and_then(decode_url)
                .filter(|url| is_fetchable(url));

            if image.obfuscated.is_some() && decoded.is_none() {
                warn!("第 {} 页地址解码失败，使用备用地址", index);
            }

            decoded
                .or_else(|| image.fallback.clone().filter(|url| is_fetchable(url)))
                .map(|image_url| ResolvedPage { index, image_url })
                .ok_or(PageError::PageResolutionFailed { index })
        })
        .collect()
}

/// 解析章节页面，返回按顺序排列的图片地址
///
/// `chapter_url` 用于解析片段中相对的 `src`。
#[instrument(skip_all)]
pub fn page_list(chapter_html: &str, chapter_url: Option<&Url>) -> Result<Vec<ResolvedPage>, PageError> {
    let document = Html::parse_document(chapter_html);
    let fragment = decrypt_fragment(&document)?;
    let refs = scan_images(&fragment, chapter_url);
    let pages = assemble(&refs)?;
    info!("共解析出 {} 页", pages.len());
    Ok(pages)
}

fn is_fetchable(url: &str) -> bool {
    Url::parse(url).is_ok_and(|url| url.scheme() == "https")
}
