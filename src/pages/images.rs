use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("无法创建img选择器"));

/// 站点把混淆后的图片地址放在 `data-*` 属性里
const OBFUSCATED_ATTR_PREFIX: &str = "data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImageRef {
    pub index: usize,
    pub obfuscated: Option<String>,
    pub fallback: Option<String>,
}

/// 按文档顺序扫描解密后片段中的图片
///
/// `base` 用于把相对的 `src` 解析为绝对地址，没有时只保留本身就是绝对地址的 `src`。
#[instrument(skip_all)]
pub fn scan_images(fragment: &str, base: Option<&Url>) -> Vec<RawImageRef> {
    let document = Html::parse_fragment(fragment);

    let refs: Vec<RawImageRef> = document
        .select(&IMG_SELECTOR)
        .enumerate()
        .map(|(index, img)| RawImageRef {
            index,
            obfuscated: obfuscated_attr(img),
            fallback: absolute_src(img, base),
        })
        .collect();

    debug!("片段中共有 {} 张图片", refs.len());
    refs
}

fn obfuscated_attr(img: ElementRef) -> Option<String> {
    let mut candidates = img
        .value()
        .attrs()
        .filter(|(name, value)| name.starts_with(OBFUSCATED_ATTR_PREFIX) && !value.is_empty());

    let first = candidates.next()?;
    // 同时存在多个 data-* 时优先取看起来像地址的那个
    let chosen = std::iter::once(first)
        .chain(candidates)
        .find(|(_, value)| value.starts_with("http"))
        .unwrap_or(first);

    Some(chosen.1.to_owned())
}

fn absolute_src(img: ElementRef, base: Option<&Url>) -> Option<String> {
    let src = img.value().attr("src")?.trim();
    if src.is_empty() {
        return None;
    }

    match Url::parse(src) {
        Ok(_) => Some(src.to_owned()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            base.and_then(|base| base.join(src).ok()).map(String::from)
        }
        Err(_) => None,
    }
}
