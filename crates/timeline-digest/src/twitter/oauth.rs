//! OAuth 1.0a request signing (HMAC-SHA1) for the Twitter v1.1 API.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Application and user credentials for signed requests.
#[derive(Clone)]
pub struct OAuthCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("access_token", &self.access_token)
            .finish_non_exhaustive()
    }
}

/// Per-request values that must be unique (nonce) or current (timestamp).
#[derive(Debug, Clone)]
pub struct Nonce {
    pub value: String,
    pub timestamp: i64,
}

impl Nonce {
    /// Fresh nonce for the current instant.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            value: uuid::Uuid::new_v4().simple().to_string(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// RFC 3986 percent-encoding as OAuth requires (unreserved set only).
fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

impl OAuthCredentials {
    /// Build the `Authorization` header value for a request.
    ///
    /// `params` are the request's query (or form) parameters, unencoded.
    #[must_use]
    pub fn authorization_header(
        &self,
        method: &str,
        base_url: &str,
        params: &[(&str, String)],
        nonce: &Nonce,
    ) -> String {
        let timestamp = nonce.timestamp.to_string();
        let mut oauth_params = vec![
            ("oauth_consumer_key", self.consumer_key.clone()),
            ("oauth_nonce", nonce.value.clone()),
            ("oauth_signature_method", "HMAC-SHA1".to_string()),
            ("oauth_timestamp", timestamp),
            ("oauth_token", self.access_token.clone()),
            ("oauth_version", "1.0".to_string()),
        ];

        let signature = self.signature(method, base_url, params, &oauth_params);
        oauth_params.push(("oauth_signature", signature));
        oauth_params.sort_by(|a, b| a.0.cmp(b.0));

        let fields = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("OAuth {fields}")
    }

    /// Compute the base64 HMAC-SHA1 signature over the signature base string.
    fn signature(
        &self,
        method: &str,
        base_url: &str,
        params: &[(&str, String)],
        oauth_params: &[(&str, String)],
    ) -> String {
        let base = signature_base_string(method, base_url, params, oauth_params);
        let key = format!(
            "{}&{}",
            encode(&self.consumer_secret),
            encode(&self.access_token_secret)
        );

        // HMAC accepts keys of any length
        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
        mac.update(base.as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }
}

/// `METHOD&url&params`, each component percent-encoded, params sorted by
/// encoded key then value.
fn signature_base_string(
    method: &str,
    base_url: &str,
    params: &[(&str, String)],
    oauth_params: &[(&str, String)],
) -> String {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .chain(oauth_params)
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    pairs.sort();

    let param_string = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(base_url),
        encode(&param_string)
    )
}
