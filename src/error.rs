use thiserror::Error;

/// 章节页面解析管线的错误
///
/// 每个变体对应管线中的一个阶段，便于定位站点结构的变化。
/// 单个 URL 无法解混淆不属于错误，见 [`crate::pages::deobfuscate`]。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("载荷提取失败: 页面中没有 htmlContent 脚本")]
    PayloadNotFound,

    #[error("载荷格式错误: {0}")]
    MalformedPayload(String),

    #[error("口令提取失败: 页面中没有 chapterHTML 解密脚本")]
    PassphraseNotFound,

    #[error("解密失败: {0}")]
    DecryptionFailed(String),

    #[error("第 {index} 页既无法解码也没有可用的备用地址")]
    PageResolutionFailed { index: usize },
}
