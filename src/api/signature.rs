use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{error, warn};

type HmacSha256 = Hmac<Sha256>;

/// Verifies `X-LiveChat-Signature`: hex HMAC-SHA256 of the raw body.
///
/// With no secret configured every request is accepted. The comparison is
/// constant-time.
#[must_use]
pub fn verify_livechat_signature(
    request_body: &[u8],
    signature: Option<&str>,
    secret: Option<&str>,
) -> bool {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        warn!("No webhook secret configured, skipping signature verification");
        return true;
    };

    let Some(signature) = signature else {
        error!("Missing X-LiveChat-Signature header");
        return false;
    };

    let Ok(expected) = hex::decode(signature.trim()) else {
        error!("Signature is not valid hex");
        return false;
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(e) => {
            error!("Failed to create HMAC: {}", e);
            return false;
        }
    };
    mac.update(request_body);

    if mac.verify_slice(&expected).is_ok() {
        true
    } else {
        error!("Webhook signature verification failed");
        false
    }
}

/// Hex signature LiveChat would send for `request_body`.
#[must_use]
pub fn compute_signature(request_body: &[u8], secret: &str) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(e) => {
            error!("Failed to create HMAC: {}", e);
            return String::new();
        }
    };
    mac.update(request_body);
    hex::encode(mac.finalize().into_bytes())
}
