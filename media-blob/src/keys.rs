use chrono::Utc;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::RngCore;

/// Characters left untouched when a key segment is placed in a URL
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const MAX_STEM_CHARS: usize = 64;
const MAX_EXTENSION_CHARS: usize = 10;
const FALLBACK_STEM: &str = "file";

/// Configuration for key derivation and public URLs
#[derive(Debug, Clone)]
pub struct KeyConfig {
    /// Public base URL objects are served from, e.g. `https://cdn.example.com/media`
    pub public_base_url: String,

    /// Length of the random key suffix in bytes (hex encoded, so twice as many chars)
    pub random_bytes: usize,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:9000/media".to_string(),
            random_bytes: 8,
        }
    }
}

impl KeyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_public_base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.public_base_url = url.into();
        self
    }

    pub fn with_random_bytes(mut self, bytes: usize) -> Self {
        self.random_bytes = bytes;
        self
    }
}

/// Derives storage keys for uploads and maps them to and from public URLs.
///
/// A key is `<prefix/><stem>-<unix millis>-<random hex><.ext>`. Only a
/// sanitized stem and the extension survive from the uploaded filename.
#[derive(Debug, Clone)]
pub struct KeyDeriver {
    base_url: String,
    random_bytes: usize,
}

impl Default for KeyDeriver {
    fn default() -> Self {
        Self::new(KeyConfig::default())
    }
}

impl KeyDeriver {
    pub fn new(config: KeyConfig) -> Self {
        Self {
            base_url: config.public_base_url.trim_end_matches('/').to_string(),
            random_bytes: config.random_bytes.max(1),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a fresh, unique key for `original_name`, optionally under `path`
    pub fn derive_key(&self, original_name: &str, path: Option<&str>) -> String {
        let (stem, extension) = split_filename(original_name);
        let prefix = path.map(normalize_prefix).unwrap_or_default();

        let mut suffix = vec![0u8; self.random_bytes];
        rand::thread_rng().fill_bytes(&mut suffix);

        format!(
            "{}{}-{}-{}{}",
            prefix,
            stem,
            Utc::now().timestamp_millis(),
            hex::encode(suffix),
            extension
        )
    }

    /// Public URL for `key`; each path segment is percent-encoded separately
    pub fn build_url(&self, key: &str) -> String {
        let encoded: Vec<String> = key
            .split('/')
            .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
            .collect();
        format!("{}/{}", self.base_url, encoded.join("/"))
    }

    /// Recover the storage key from a public URL.
    ///
    /// Exact inverse of [`build_url`](Self::build_url). URLs that don't start
    /// with the configured base are decoded as a whole and returned as-is.
    /// Whether `url` points under the public base, i.e. was built here
    pub fn owns_url(&self, url: &str) -> bool {
        url.strip_prefix(self.base_url.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    pub fn key_from_url(&self, url: &str) -> String {
        let prefix = format!("{}/", self.base_url);
        let remainder = match url.strip_prefix(&prefix) {
            Some(rest) => rest,
            None => {
                tracing::debug!(url, base = %self.base_url, "url outside public base, decoding verbatim");
                url
            }
        };
        percent_decode_str(remainder).decode_utf8_lossy().into_owned()
    }

    /// Folder part of a key, up to and including the last `/` (empty at the root)
    pub fn folder_of(key: &str) -> &str {
        match key.rfind('/') {
            Some(idx) => &key[..=idx],
            None => "",
        }
    }
}

/// Split an uploaded filename into a sanitized stem and a lowercase `.ext`
fn split_filename(original_name: &str) -> (String, String) {
    // browsers on some platforms send the full client path
    let name = original_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(original_name)
        .trim();

    let (raw_stem, raw_ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };

    let extension = raw_ext
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_CHARS
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();

    (sanitize_stem(raw_stem), extension)
}

fn sanitize_stem(raw: &str) -> String {
    let mut stem = String::with_capacity(raw.len().min(MAX_STEM_CHARS));
    let mut pending_dash = false;

    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !stem.is_empty() {
                stem.push('-');
            }
            pending_dash = false;
            stem.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
        if stem.len() >= MAX_STEM_CHARS {
            break;
        }
    }

    if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem
    }
}

/// `"/a//b/"` -> `"a/b/"`; dot segments are dropped
fn normalize_prefix(path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect();

    if segments.is_empty() {
        String::new()
    } else {
        format!("{}/", segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn deriver() -> KeyDeriver {
        KeyDeriver::new(KeyConfig::new().with_public_base_url("https://cdn.example.com/media/"))
    }

    #[test]
    fn key_keeps_prefix_stem_and_extension() {
        let key = deriver().derive_key("Holiday Photo.JPG", Some("/listings/42/"));
        assert!(key.starts_with("listings/42/holiday-photo-"), "{key}");
        assert!(key.ends_with(".jpg"), "{key}");

        let middle = key
            .trim_start_matches("listings/42/holiday-photo-")
            .trim_end_matches(".jpg");
        let (millis, random) = middle.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(random.len(), 16);
        assert!(random.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn unusable_names_fall_back_to_generic_stem() {
        let key = deriver().derive_key("???", None);
        assert!(key.starts_with("file-"), "{key}");

        let dotfile = deriver().derive_key(".env", None);
        assert!(dotfile.starts_with("env-"), "{dotfile}");
        assert!(!dotfile.contains('.'), "{dotfile}");
    }

    #[test]
    fn client_paths_are_discarded() {
        let key = deriver().derive_key("C:\\Users\\me\\cat.png", None);
        assert!(key.starts_with("cat-"), "{key}");
    }

    #[test]
    fn keys_are_unique_for_identical_names() {
        let deriver = deriver();
        let keys: HashSet<String> = (0..2_000)
            .map(|_| deriver.derive_key("same.png", Some("a")))
            .collect();
        assert_eq!(keys.len(), 2_000);
    }

    #[test]
    fn url_round_trips_derived_keys() {
        let deriver = deriver();
        for (name, path) in [
            ("photo.png", None),
            ("ünïcødé name.webp", Some("users/Zoë Q/åäö")),
            ("a+b=c&d.pdf", Some("weird #path/?q=1")),
        ] {
            let key = deriver.derive_key(name, path);
            let url = deriver.build_url(&key);
            assert!(url.starts_with("https://cdn.example.com/media/"));
            assert_eq!(deriver.key_from_url(&url), key);
        }
    }

    #[test]
    fn url_encodes_each_segment() {
        let url = deriver().build_url("folder one/a b.png");
        assert_eq!(url, "https://cdn.example.com/media/folder%20one/a%20b.png");
    }

    #[test]
    fn only_urls_under_the_base_are_owned() {
        let keys = deriver();
        let key = keys.derive_key("a.png", Some("x"));
        assert!(keys.owns_url(&keys.build_url(&key)));
        assert!(!keys.owns_url("https://elsewhere.example.org/x/a.png"));
        assert!(!keys.owns_url(&format!("{}-other/a.png", keys.base_url())));
    }

    #[test]
    fn foreign_url_is_decoded_verbatim() {
        let key = deriver().key_from_url("https://elsewhere.example.org/x%20y.png");
        assert_eq!(key, "https://elsewhere.example.org/x y.png");
    }

    #[test]
    fn folder_of_key() {
        assert_eq!(KeyDeriver::folder_of("a/b/c.png"), "a/b/");
        assert_eq!(KeyDeriver::folder_of("c.png"), "");
    }
}
