use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::codec::{decode_base64, decode_hex};
use crate::error::PageError;

static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("无法创建script选择器"));

/// 保存密文 JSON 的脚本变量
const PAYLOAD_VAR: &str = "htmlContent";
/// 保存解密调用的脚本变量
const PASSPHRASE_VAR: &str = "chapterHTML";
/// 站点前端调用的解密函数名
const DECRYPT_CALL: &str = "CryptoJSAesDecrypt";

pub const IV_LEN: usize = 16;

/// CryptoJS 输出的 `{"ct": .., "iv": .., "s": ..}`
#[derive(Deserialize)]
struct CipherDto {
    #[serde(rename = "ct")]
    ciphertext: String,
    iv: String,
    #[serde(rename = "s")]
    salt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherPayload {
    pub ciphertext: Vec<u8>,
    pub iv: [u8; IV_LEN],
    pub salt: Vec<u8>,
}

impl CipherPayload {
    /// 解析反转义后的 JSON 文本
    pub fn from_json(text: &str) -> Result<Self, PageError> {
        let dto: CipherDto = serde_json::from_str(text)
            .map_err(|e| PageError::MalformedPayload(format!("JSON 解析失败: {}", e)))?;

        let ciphertext = decode_base64(&dto.ciphertext)
            .map_err(|e| PageError::MalformedPayload(format!("ct 不是合法的 Base64: {}", e)))?;
        let iv = decode_hex(&dto.iv)
            .map_err(|e| PageError::MalformedPayload(format!("iv 不是合法的十六进制: {}", e)))?;
        let iv: [u8; IV_LEN] = iv.try_into().map_err(|iv: Vec<u8>| {
            PageError::MalformedPayload(format!("iv 长度应为 {} 字节，实际为 {}", IV_LEN, iv.len()))
        })?;
        let salt = decode_hex(&dto.salt)
            .map_err(|e| PageError::MalformedPayload(format!("s 不是合法的十六进制: {}", e)))?;

        Ok(Self {
            ciphertext,
            iv,
            salt,
        })
    }
}

#[instrument(skip_all)]
pub fn extract_payload(document: &Html) -> Result<CipherPayload, PageError> {
    let literal = script_bodies(document)
        .find_map(|body| {
            let rhs = assignment(&body, PAYLOAD_VAR)?;
            Cursor::new(rhs).quoted().map(unescape)
        })
        .ok_or(PageError::PayloadNotFound)?;

    debug!("找到 htmlContent 脚本, 长度: {}", literal.len());
    let payload = CipherPayload::from_json(&literal)?;
    debug!(
        "密文长度: {}, 盐长度: {}",
        payload.ciphertext.len(),
        payload.salt.len()
    );
    Ok(payload)
}

#[instrument(skip_all)]
pub fn extract_passphrase(document: &Html) -> Result<String, PageError> {
    let passphrase = script_bodies(document)
        .find_map(|body| assignment(&body, PASSPHRASE_VAR).and_then(parse_decrypt_call))
        .ok_or(PageError::PassphraseNotFound)?;

    debug!("找到解密口令, 长度: {}", passphrase.len());
    Ok(passphrase)
}

fn script_bodies(document: &Html) -> impl Iterator<Item = String> + '_ {
    document
        .select(&SCRIPT_SELECTOR)
        .map(|script| script.text().collect::<String>())
}

/// 返回 `name = ...` 中等号右侧的文本，跳过 `name == ...` 和非赋值的引用
fn assignment<'a>(body: &'a str, name: &str) -> Option<&'a str> {
    let mut rest = body;
    while let Some(pos) = rest.find(name) {
        let preceded_by_ident = rest[..pos]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$');
        rest = &rest[pos + name.len()..];
        if preceded_by_ident {
            continue;
        }
        if let Some(rhs) = rest.trim_start().strip_prefix('=') {
            if !rhs.starts_with('=') {
                return Some(rhs.trim_start());
            }
        }
    }
    None
}

/// 解析 `CryptoJSAesDecrypt('seg' + "seg" + ..., htmlContent)` 的第一个参数
///
/// 口令可能被拆成多段用 `+` 拼接，这里按顺序把所有段连起来。
fn parse_decrypt_call(rhs: &str) -> Option<String> {
    let mut cursor = Cursor::new(rhs);
    if !cursor.eat(DECRYPT_CALL) || !cursor.eat("(") {
        return None;
    }

    let mut passphrase = unescape(cursor.quoted()?);
    while cursor.eat("+") {
        passphrase.push_str(&unescape(cursor.quoted()?));
    }

    (cursor.eat(",") || cursor.eat(")")).then_some(passphrase)
}

/// 只处理 JS 字面量里会出现的转义，其余原样保留
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next @ ('"' | '\'' | '\\' | '/')) => out.push(next),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    fn eat(&mut self, token: &str) -> bool {
        self.rest = self.rest.trim_start();
        match self.rest.strip_prefix(token) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    /// 读取一个单引号或双引号字面量，返回未反转义的内容
    fn quoted(&mut self) -> Option<&'a str> {
        self.rest = self.rest.trim_start();
        let quote = self.rest.chars().next().filter(|c| *c == '\'' || *c == '"')?;
        let body = &self.rest[1..];

        let mut escaped = false;
        for (i, c) in body.char_indices() {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                self.rest = &body[i + 1..];
                return Some(&body[..i]);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(scripts: &[&str]) -> Html {
        let mut html = String::from("<html><head>");
        for script in scripts {
            html.push_str("<script>");
            html.push_str(script);
            html.push_str("</script>");
        }
        html.push_str("</head><body></body></html>");
        Html::parse_document(&html)
    }

    #[test]
    fn passphrase_segments_are_joined_in_order() {
        let document = page(&[r#"var chapterHTML=CryptoJSAesDecrypt("abc"+'def',htmlContent);"#]);
        assert_eq!(extract_passphrase(&document).unwrap(), "abcdef");
    }

    #[test]
    fn passphrase_tolerates_whitespace_and_many_segments() {
        let document = page(&[
            "var x = 1;",
            "var chapterHTML = CryptoJSAesDecrypt( 'a1' + 'b2' +\n 'c\\'3' , htmlContent );",
        ]);
        assert_eq!(extract_passphrase(&document).unwrap(), "a1b2c'3");
    }

    #[test]
    fn single_segment_passphrase() {
        let document = page(&["var chapterHTML=CryptoJSAesDecrypt('only',htmlContent);"]);
        assert_eq!(extract_passphrase(&document).unwrap(), "only");
    }

    #[test]
    fn missing_passphrase_script() {
        let document = page(&[r#"var htmlContent="{}";"#]);
        assert_eq!(
            extract_passphrase(&document),
            Err(PageError::PassphraseNotFound)
        );
    }

    #[test]
    fn passphrase_requires_decrypt_call() {
        let document = page(&["var chapterHTML=somethingElse('abc',htmlContent);"]);
        assert_eq!(
            extract_passphrase(&document),
            Err(PageError::PassphraseNotFound)
        );
    }

    #[test]
    fn payload_is_unescaped_and_decoded() {
        let document = page(&[
            "var chapterHTML=CryptoJSAesDecrypt('p',htmlContent);",
            r#"var htmlContent="{\"ct\":\"q83v\/w==\",\"iv\":\"000102030405060708090a0b0c0d0e0f\",\"s\":\"cafe\"}";"#,
        ]);

        let payload = extract_payload(&document).unwrap();
        assert_eq!(payload.ciphertext, vec![0xab, 0xcd, 0xef, 0xff]);
        assert_eq!(payload.iv, core::array::from_fn(|i| i as u8));
        assert_eq!(payload.salt, vec![0xca, 0xfe]);
    }

    #[test]
    fn payload_not_found() {
        let document = page(&["var chapterHTML=CryptoJSAesDecrypt('p',htmlContent);"]);
        assert_eq!(extract_payload(&document), Err(PageError::PayloadNotFound));
    }

    #[test]
    fn payload_missing_field_is_malformed() {
        let document = page(&[r#"var htmlContent="{\"ct\":\"aGVsbG8=\",\"iv\":\"00\"}";"#]);
        assert!(matches!(
            extract_payload(&document),
            Err(PageError::MalformedPayload(_))
        ));
    }

    #[test]
    fn payload_with_short_iv_is_malformed() {
        let document =
            page(&[r#"var htmlContent="{\"ct\":\"aGVsbG8=\",\"iv\":\"0001\",\"s\":\"00\"}";"#]);
        assert!(matches!(
            extract_payload(&document),
            Err(PageError::MalformedPayload(_))
        ));
    }

    #[test]
    fn ciphertext_must_be_base64() {
        let err = CipherPayload::from_json(
            r#"{"ct":"q83v!!w=","iv":"000102030405060708090a0b0c0d0e0f","s":"cafe"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, PageError::MalformedPayload(ref msg) if msg.starts_with("ct ")));
    }

    #[test]
    fn salt_must_be_hex() {
        let document = page(&[
            r#"var htmlContent="{\"ct\":\"q83v\/w==\",\"iv\":\"000102030405060708090a0b0c0d0e0f\",\"s\":\"zz\"}";"#,
        ]);
        let err = extract_payload(&document).unwrap_err();
        assert!(matches!(err, PageError::MalformedPayload(ref msg) if msg.starts_with("s ")));
    }

    #[test]
    fn assignment_skips_references_and_comparisons() {
        let body = "if (htmlContent == x) {} foo(htmlContent); myhtmlContent='no'; htmlContent = 'yes'";
        assert_eq!(assignment(body, "htmlContent"), Some("'yes'"));
    }

    #[test]
    fn unescape_keeps_unknown_escapes() {
        assert_eq!(unescape(r#"a\"b\\c\/d\ne"#), "a\"b\\c/d\\ne");
    }
}
