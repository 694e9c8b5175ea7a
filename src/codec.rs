use base64::prelude::*;

pub fn decode_hex(input: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(input.trim())
}

#[cfg(test)]
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// 标准 Base64，容忍换行（站点偶尔会把长密文折行输出）
pub fn decode_base64(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    BASE64_STANDARD.decode(compact)
}

#[cfg(test)]
pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64_STANDARD.encode(bytes)
}
