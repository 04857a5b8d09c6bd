//! Origin resolution.
//!
//! The expected peer origin for a handshake is the scheme+host+port of
//! the target URL. Relative or unparseable URLs fall back to the local
//! document origin, matching frames navigated within the same origin.

use url::Url;

/// Resolve the origin of a target URL, falling back to `local_origin`
/// when the URL is relative or empty.
pub fn resolve_origin(target_url: &str, local_origin: &str) -> String {
    match Url::parse(target_url) {
        Ok(url) => {
            let origin = url.origin();
            if origin.is_tuple() {
                origin.ascii_serialization()
            } else {
                local_origin.to_string()
            }
        }
        Err(_) => local_origin.to_string(),
    }
}
