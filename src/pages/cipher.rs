use aes::Aes256;
use cbc::cipher::{BlockDecryptMut, KeyIvInit, block_padding::Pkcs7};
use sha2::Sha512;
use tracing::{debug, instrument};

use super::payload::{CipherPayload, IV_LEN};
use crate::error::PageError;

type Aes256CbcDec = cbc::Decryptor<Aes256>;

// 与站点前端的 CryptoJS 参数保持一致，任何一项不同都会得到错误的明文
pub const PBKDF2_ITERATIONS: u32 = 999;
pub const KEY_LEN: usize = 32;

/// PBKDF2-HMAC-SHA512 派生 256 位 AES 密钥
pub fn derive_key(passphrase: &str, salt: &[u8]) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha512>(passphrase.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    key
}

/// AES-256-CBC + PKCS7 解密，返回 UTF-8 明文
pub fn decrypt(
    passphrase: &str,
    salt: &[u8],
    iv: &[u8; IV_LEN],
    ciphertext: &[u8],
) -> Result<String, PageError> {
    if ciphertext.is_empty() || ciphertext.len() % IV_LEN != 0 {
        return Err(PageError::DecryptionFailed(format!(
            "密文长度 {} 不是块大小的整数倍",
            ciphertext.len()
        )));
    }

    let key = derive_key(passphrase, salt);
    let plain = Aes256CbcDec::new_from_slices(&key, iv)
        .map_err(|e| PageError::DecryptionFailed(format!("无法初始化 AES-CBC: {}", e)))?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| PageError::DecryptionFailed("填充校验失败，口令或盐可能不正确".to_owned()))?;

    String::from_utf8(plain)
        .map_err(|e| PageError::DecryptionFailed(format!("明文不是合法的 UTF-8: {}", e)))
}

#[instrument(skip_all)]
pub fn decrypt_payload(passphrase: &str, payload: &CipherPayload) -> Result<String, PageError> {
    let fragment = decrypt(passphrase, &payload.salt, &payload.iv, &payload.ciphertext)?;
    debug!("解密成功, 明文长度: {}", fragment.len());
    Ok(fragment)
}
