use scraper::Html;
use url::Url;

use vcomycs_fetch::pages::{decrypt_fragment, scan_images};
use vcomycs_fetch::{PageError, ResolvedPage, page_list};

/// `htmlContent` 字面量，已按站点的方式转义 `"`、`/`
const PAYLOAD_LITERAL: &str = concat!(
    r#"{\"ct\":\"pvE9NiToBGP\/VjokeVwF\/3bkIpslXkQWTKLArrcfQd3hr4XZgo\/0Nw46WfIKjGYlX9E"#,
    r#"BaPV69ScPrR2uqxE+PMnz8fvY2iCXGBRN+O9dRMMZeWzFCtf+D5R7WrlBVDtb3PEIw4xsxBRqoZNCZ2M"#,
    r#"tBLiGPRf7dlk2bIpUyrv8g8QkT5WkdgjIXVP7d+w5NQxD951uTS0rczcbn6n8LPcGvTeL4QPxv4hnlAn"#,
    r#"K00lBrwH+iQennFGpxckD1VUjCfNCodVuyMgwO0LUw9du52S0Kyj7Rc9w3RAysdcrZ0FU\/ZJR3Bu1zR"#,
    r#"AIW6IiwTFkaRoznr8Gqp2\/cp2yyOg9AKxoKmxf1hB6xv5rc6qFLIY9\/PbKQ1zqOWhtlMlwGUcGpuvI"#,
    r#"oBjaOYFS7R4JWy1Bz1vFMSRs3280njVqWhqNjugs0NM1YOouU2kdZNZEMc4TbEb0zRJdLdgcoFyLHSmp"#,
    r#"uUfO95kwaRiEV+qrcvzE7SCpgKg=\",\"iv\":\"8d2b6f0e4a19c3577e01b9d4f6a2c831\",\"s\""#,
    r#":\"3f1c9a7be04d8e21a55f0c6d9b2e7a48\"}"#,
);

/// 与密文对应的明文片段
const FRAGMENT: &str = concat!(
    r#"<div class="chapter-img">"#,
    r#"<img class="lazy" data-src="httpsZq7RkmP3vWmP3vWcdntY8uXvcomycstY8uXtestmP3vWuploadsmP3vW2024mP3vW05mP3vW001tY8uXwebp" src="/wp-content/loading.gif" alt="1">"#,
    r#"<img src="https://cdn.vcomycs.test/uploads/2024/05/002.png" alt="2">"#,
    r#"<img data-original="httpsa1bc2dc2dcdne3fvcomycse3ftestc2duploadsc2d2024c2d05c2d003e3fjpg" alt="3">"#,
    r#"</div>"#,
);

fn chapter_page(passphrase_expr: Option<&str>) -> String {
    let mut html = String::from(
        r#"<!DOCTYPE html><html><head><title>Chap 1</title>
<script>window.dataLayer = window.dataLayer || [];</script>
</head><body><div id="chapter-content"></div>
"#,
    );
    html.push_str(&format!("<script>var htmlContent=\"{}\";</script>\n", PAYLOAD_LITERAL));
    if let Some(expr) = passphrase_expr {
        html.push_str(&format!(
            "<script>var chapterHTML=CryptoJSAesDecrypt({},htmlContent);document.getElementById('chapter-content').innerHTML=chapterHTML;</script>\n",
            expr
        ));
    }
    html.push_str("</body></html>");
    html
}

fn chapter_url() -> Url {
    Url::parse("https://vivicomi6.info/truyen-tranh/abc/chap-1/").unwrap()
}

#[test]
fn decrypts_fragment_from_split_passphrase() {
    let document = Html::parse_document(&chapter_page(Some("'abc'+'def'")));
    assert_eq!(decrypt_fragment(&document).unwrap(), FRAGMENT);
}

#[test]
fn resolves_pages_in_document_order() {
    let html = chapter_page(Some(r#""ab" + 'c' + "def""#));
    let pages = page_list(&html, Some(&chapter_url())).unwrap();

    let expected = [
        "https://cdn.vcomycs.test/uploads/2024/05/001.webp",
        "https://cdn.vcomycs.test/uploads/2024/05/002.png",
        "https://cdn.vcomycs.test/uploads/2024/05/003.jpg",
    ];
    assert_eq!(
        pages,
        expected
            .iter()
            .enumerate()
            .map(|(index, url)| ResolvedPage {
                index,
                image_url: url.to_string(),
            })
            .collect::<Vec<_>>()
    );
}

#[test]
fn scanner_sees_every_image() {
    let refs = scan_images(FRAGMENT, Some(&chapter_url()));
    assert_eq!(refs.len(), 3);
    assert_eq!(
        refs[0].fallback.as_deref(),
        Some("https://vivicomi6.info/wp-content/loading.gif")
    );
    assert!(refs[1].obfuscated.is_none());
    assert!(refs[2].fallback.is_none());
}

#[test]
fn wrong_passphrase_is_a_decryption_failure() {
    let html = chapter_page(Some("'abc'+'xyz'"));
    assert!(matches!(
        page_list(&html, None),
        Err(PageError::DecryptionFailed(_))
    ));
}

#[test]
fn missing_passphrase_script() {
    let html = chapter_page(None);
    assert_eq!(page_list(&html, None), Err(PageError::PassphraseNotFound));
}

#[test]
fn missing_payload_script() {
    let html = "<html><body><script>var chapterHTML=CryptoJSAesDecrypt('abc',htmlContent);</script></body></html>";
    assert_eq!(page_list(html, None), Err(PageError::PayloadNotFound));
}
