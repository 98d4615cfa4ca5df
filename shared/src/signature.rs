use base64::{engine::general_purpose::STANDARD, Engine as _};
use md5::Md5;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::params::Params;

const METHOD: &str = "GET";
const PATH_PREFIX: &str = "/sas/embed_token/";

// Characters kept from the wrapped base64 of an MD5 digest
const MD5_SIGNATURE_LENGTH: usize = 43;
// Output line width of MIME style base64
const BASE64_LINE_LENGTH: usize = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HashingMethod {
    Md5,
    #[default]
    Sha256,
}

impl HashingMethod {
    /// Anything other than `MD5` means SHA-256.
    pub fn from_name(name: &str) -> Self {
        if name == "MD5" {
            HashingMethod::Md5
        } else {
            HashingMethod::Sha256
        }
    }
}

pub fn build_string_to_sign(
    secret: &str,
    pcode: &str,
    embed_code: &str,
    params: &Params,
) -> String {
    let mut string_to_sign = format!("{secret}{METHOD}{PATH_PREFIX}{pcode}/{embed_code}");
    for (key, value) in params.non_empty() {
        string_to_sign.push_str(key);
        string_to_sign.push('=');
        string_to_sign.push_str(value);
    }
    string_to_sign
}

pub fn sign(string_to_sign: &str, hashing_method: HashingMethod) -> String {
    match hashing_method {
        HashingMethod::Md5 => md5_signature(string_to_sign),
        HashingMethod::Sha256 => sha256_signature(string_to_sign),
    }
}

pub fn generate_signature(
    secret: &str,
    pcode: &str,
    embed_code: &str,
    hashing_method: HashingMethod,
    params: &Params,
) -> String {
    let string_to_sign = build_string_to_sign(secret, pcode, embed_code, params);
    sign(&string_to_sign, hashing_method)
}

/// Keeps the first 43 characters of the wrapped encoding, padding and line
/// break included, and applies no escaping.
fn md5_signature(string_to_sign: &str) -> String {
    let digest = Md5::digest(string_to_sign.as_bytes());
    wrapped_base64(&digest)
        .chars()
        .take(MD5_SIGNATURE_LENGTH)
        .collect()
}

fn sha256_signature(string_to_sign: &str) -> String {
    debug!("String to sign: {string_to_sign}");
    let digest = Sha256::digest(string_to_sign.as_bytes());
    let encoded = wrapped_base64(&digest);
    let unpadded = encoded.trim_end().trim_end_matches('=');
    let signature = urlencoding::encode(unpadded).into_owned();
    debug!("Signature: {signature}");
    signature
}

/// Standard alphabet with padding, a newline after every 60 characters and
/// after the last line. Empty input encodes to an empty string.
fn wrapped_base64(bytes: &[u8]) -> String {
    let encoded = STANDARD.encode(bytes);
    let mut wrapped = String::with_capacity(encoded.len() + encoded.len() / BASE64_LINE_LENGTH + 1);
    for (i, c) in encoded.chars().enumerate() {
        if i > 0 && i % BASE64_LINE_LENGTH == 0 {
            wrapped.push('\n');
        }
        wrapped.push(c);
    }
    if !wrapped.is_empty() {
        wrapped.push('\n');
    }
    wrapped
}
