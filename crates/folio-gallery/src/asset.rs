//! Asset locator handling
//!
//! Public object URLs have the shape
//! `{base}{public_prefix}/{bucket}/{storage path}`. Deletion needs the
//! storage path back; uploads need the URL.

use crate::config::GalleryConfig;
use crate::error::NotResolvable;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use url::Url;

/// Characters escaped inside a path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Extract the storage path from a public asset URL
///
/// # Errors
/// `NotResolvable` if the URL does not parse, its path does not contain the
/// configured bucket prefix, or it names the bucket root.
pub fn resolve_asset_path(url: &str, config: &GalleryConfig) -> Result<String, NotResolvable> {
    let not_resolvable = || NotResolvable { url: url.to_string() };

    let parsed = Url::parse(url).map_err(|_| not_resolvable())?;
    let prefix = config.object_prefix();
    // Proxies may mount storage under an extra base path
    let rest = parsed
        .path()
        .find(prefix.as_str())
        .map(|at| &parsed.path()[at + prefix.len()..])
        .ok_or_else(not_resolvable)?;

    let path = percent_decode_str(rest)
        .decode_utf8()
        .map_err(|_| not_resolvable())?
        .into_owned();

    if path.is_empty() || path.split('/').any(|s| s.is_empty() || s == "..") {
        return Err(not_resolvable());
    }
    Ok(path)
}

/// Build the public URL of a storage path
#[must_use]
pub fn asset_public_url(path: &str, config: &GalleryConfig) -> String {
    let encoded: Vec<String> = path
        .split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect();
    format!(
        "{}{}{}",
        config.public_base_url.trim_end_matches('/'),
        config.object_prefix(),
        encoded.join("/")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GalleryConfig {
        GalleryConfig::default().with_public_base_url("https://abc.supabase.co")
    }

    #[test]
    fn resolves_public_url() {
        let url = "https://abc.supabase.co/storage/v1/object/public/images/u1/u1-k3j.jpg";
        assert_eq!(resolve_asset_path(url, &config()).unwrap(), "u1/u1-k3j.jpg");
    }

    #[test]
    fn decodes_escaped_segments() {
        let url = "https://abc.supabase.co/storage/v1/object/public/images/u1/summer%20sea.jpg";
        assert_eq!(resolve_asset_path(url, &config()).unwrap(), "u1/summer sea.jpg");
    }

    #[test]
    fn prefix_under_a_proxy_path_resolves() {
        let url = "https://photos.example.com/api/storage/v1/object/public/images/u1/a.jpg";
        assert_eq!(resolve_asset_path(url, &config()).unwrap(), "u1/a.jpg");
    }

    #[test]
    fn query_string_is_ignored() {
        let url = "https://abc.supabase.co/storage/v1/object/public/images/a.png?width=800";
        assert_eq!(resolve_asset_path(url, &config()).unwrap(), "a.png");
    }

    #[test]
    fn foreign_locators_are_not_resolvable() {
        for url in [
            "/placeholder.svg?height=800&width=1200",
            "https://cdn.example.com/a.jpg",
            "https://abc.supabase.co/storage/v1/object/public/other/a.jpg",
            "https://abc.supabase.co/storage/v1/object/public/images/",
            "https://abc.supabase.co/storage/v1/object/public/images/a//b.jpg",
        ] {
            let err = resolve_asset_path(url, &config()).unwrap_err();
            assert_eq!(err.url, url);
        }
    }

    #[test]
    fn public_url_resolves_back() {
        let config = config();
        let url = asset_public_url("u1/summer sea.jpg", &config);
        assert_eq!(
            url,
            "https://abc.supabase.co/storage/v1/object/public/images/u1/summer%20sea.jpg"
        );
        assert_eq!(resolve_asset_path(&url, &config).unwrap(), "u1/summer sea.jpg");
    }
}
