//! 图片地址解混淆
//!
//! 站点把地址中的 `:`、`/`、`.` 分别替换成三段等长的随机串，长度未知但同一地址内一致。
//! 地址总是以 `https` 开头，紧接着是 `:` 的替身和两个 `/` 的替身，
//! 所以只要找到开头处两段相同的串，就能确定替身长度。

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

pub const MAX_TOKEN_LEN: usize = 20;

struct Patterns {
    len: usize,
    /// `https` + `:` 替身 + 两个 `/` 替身
    check: Regex,
    /// 四字母扩展名，需要先于三字符的情况尝试
    long_ext: Regex,
    short_ext: Regex,
}

impl Patterns {
    fn new(len: usize) -> Self {
        let compile = |pattern: String| Regex::new(&pattern).expect("解混淆正则编译失败");
        Self {
            len,
            check: compile(format!(r"^https.{{{len}}}(.{{{len}}})(.{{{len}}})")),
            long_ext: compile(format!(
                r"^https(.{{{len}}})(.{{{len}}}).*(.{{{len}}})(?:webp|jpeg|tiff)$"
            )),
            short_ext: compile(format!(r"^https(.{{{len}}})(.{{{len}}}).*(.{{{len}}}).{{3}}$")),
        }
    }

    fn has_identical_slashes(&self, url: &str) -> bool {
        self.check
            .captures(url)
            .is_some_and(|caps| caps[1] == caps[2])
    }

    fn substitute(&self, url: &str) -> Option<String> {
        let caps = self
            .long_ext
            .captures(url)
            .or_else(|| self.short_ext.captures(url))?;
        let (colon, slash, period) = (&caps[1], &caps[2], &caps[3]);

        Some(
            url.replace(colon, ":")
                .replace(slash, "/")
                .replace(period, "."),
        )
    }
}

/// 从长到短排列，较长的替身更不容易误匹配
static PATTERNS: LazyLock<Vec<Patterns>> =
    LazyLock::new(|| (1..=MAX_TOKEN_LEN).rev().map(Patterns::new).collect());

fn find_patterns(url: &str) -> Option<&'static Patterns> {
    PATTERNS.iter().find(|p| p.has_identical_slashes(url))
}

/// 还原混淆后的图片地址
///
/// 返回 `None` 表示该地址不符合混淆格式，调用方应改用备用地址。
pub fn decode_url(obfuscated: &str) -> Option<String> {
    let Some(patterns) = find_patterns(obfuscated) else {
        debug!("未找到匹配的替身长度: {}", obfuscated);
        return None;
    };

    let decoded = patterns.substitute(obfuscated);
    match &decoded {
        Some(url) => debug!("替身长度 {}, 解码为: {}", patterns.len, url),
        None => debug!("替身长度 {} 无法定位扩展名: {}", patterns.len, obfuscated),
    }
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obfuscate(url: &str, colon: &str, slash: &str, period: &str) -> String {
        url.replace('.', period)
            .replace('/', slash)
            .replace(':', colon)
    }

    #[test]
    fn recovers_every_token_length() {
        for len in 1..=MAX_TOKEN_LEN {
            let (colon, slash, period) = ("#".repeat(len), "~".repeat(len), "!".repeat(len));
            for url in [
                "https://img.host/p/01.jpg",
                "https://cdn.example/comics/12/003.webp",
            ] {
                let obfuscated = obfuscate(url, &colon, &slash, &period);
                assert_eq!(find_patterns(&obfuscated).map(|p| p.len), Some(len));
                assert_eq!(decode_url(&obfuscated).as_deref(), Some(url), "len = {}", len);
            }
        }
    }

    #[test]
    fn longest_token_wins() {
        let url = "httpsabkkkkZZZZkZZZZimgdotdthostkZZZZpkZZZZ01dotdtjpg";
        // 长度 2 时开头同样有两段相同的串 "kk"
        assert!(PATTERNS[MAX_TOKEN_LEN - 2].has_identical_slashes(url));
        assert_eq!(find_patterns(url).map(|p| p.len), Some(5));
        assert_eq!(decode_url(url).as_deref(), Some("https://img.host/p/01.jpg"));
    }

    #[test]
    fn four_letter_extension_keeps_period_token() {
        let url = "httpsZq7RkmP3vWmP3vWcdntY8uXvcomycstY8uXtestmP3vWuploadsmP3vW2024mP3vW05mP3vW001tY8uXwebp";
        assert_eq!(
            decode_url(url).as_deref(),
            Some("https://cdn.vcomycs.test/uploads/2024/05/001.webp")
        );
    }

    #[test]
    fn plain_urls_without_identical_pair_are_not_decoded() {
        assert_eq!(decode_url("http://a.b/c.png"), None);
        assert_eq!(decode_url("/wp-content/loading.gif"), None);
        assert_eq!(decode_url(""), None);
    }

    #[test]
    fn plain_https_url_decodes_to_itself() {
        let url = "https://img.host/p/01.jpg";
        assert_eq!(decode_url(url).as_deref(), Some(url));
    }

    #[test]
    fn no_room_for_extension() {
        assert_eq!(decode_url("https#~~ab"), None);
    }
}
