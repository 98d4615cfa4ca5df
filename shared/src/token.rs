use thiserror::Error;
use tracing::debug;

use crate::params::Params;
use crate::signature::{build_string_to_sign, sign, HashingMethod};

/// Number of trailing API key characters that are not part of the pcode.
pub const API_KEY_SUFFIX_LENGTH: usize = 6;

pub const API_KEY_PARAM: &str = "api_key";
pub const SIGNATURE_PARAM: &str = "signature";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error(
        "API key is {length} characters long, must be at least {}.",
        API_KEY_SUFFIX_LENGTH
    )]
    ApiKeyTooShort { length: usize },
}

/// The pcode is the API key without its last 6 characters.
///
/// Keys shorter than that are rejected rather than sliced.
pub fn pcode_from_api_key(api_key: &str) -> Result<&str, TokenError> {
    let length = api_key.chars().count();
    if length < API_KEY_SUFFIX_LENGTH {
        return Err(TokenError::ApiKeyTooShort { length });
    }
    let end = api_key
        .char_indices()
        .nth(length - API_KEY_SUFFIX_LENGTH)
        .map(|(i, _)| i)
        .unwrap_or(api_key.len());
    Ok(&api_key[..end])
}

/// Builds `https://{server}/embed_token/{pcode}/{embed_code}?k=v&...` from the
/// non-empty params in key order.
pub fn generate_token(server: &str, pcode: &str, embed_code: &str, params: &Params) -> String {
    let query = params
        .non_empty()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    let base = format!("https://{server}/embed_token/{pcode}/{embed_code}");
    if query.is_empty() {
        base
    } else {
        format!("{base}?{query}")
    }
}

/// Everything needed to issue one token. Built once by the caller and
/// consumed by [`TokenRequest::generate`].
#[derive(Debug, Clone)]
pub struct TokenRequest {
    pub server: String,
    pub api_key: String,
    pub api_secret: String,
    pub embed_code: String,
    pub hashing_method: HashingMethod,
    /// Constraint parameters such as `expires` or `device`. `api_key` and
    /// `signature` are filled in during generation.
    pub params: Params,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedToken {
    pub string_to_sign: String,
    pub signature: String,
    pub url: String,
}

impl TokenRequest {
    pub fn generate(self) -> Result<GeneratedToken, TokenError> {
        let pcode = pcode_from_api_key(&self.api_key)?;

        let mut params = self.params;
        params.insert(API_KEY_PARAM, self.api_key.as_str());

        let string_to_sign =
            build_string_to_sign(&self.api_secret, pcode, &self.embed_code, &params);
        let signature = sign(&string_to_sign, self.hashing_method);

        params.insert(SIGNATURE_PARAM, signature.as_str());
        let url = generate_token(&self.server, pcode, &self.embed_code, &params);
        debug!(
            "Generated token for pcode [{pcode}] and embed code [{}]",
            self.embed_code
        );

        Ok(GeneratedToken {
            string_to_sign,
            signature,
            url,
        })
    }
}
