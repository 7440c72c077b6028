/// Client side of the image store: the core only ever holds opaque keys and
/// resolves them to retrievable URLs; upload and storage live elsewhere.
#[derive(Debug, Clone)]
pub struct AssetStore {
    base_url: String,
}

impl AssetStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Mints a fresh key for an uploaded recipe image.
    pub fn new_key(extension: &str) -> String {
        format!("recipes/{}.{}", uuid::Uuid::new_v4(), extension)
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_base_and_key() {
        let store = AssetStore::new("https://media.example.com/");
        assert_eq!(
            store.url_for("recipes/4c7fca8e.png"),
            "https://media.example.com/recipes/4c7fca8e.png"
        );
    }

    #[test]
    fn keys_are_unique_and_keep_the_extension() {
        let a = AssetStore::new_key("png");
        let b = AssetStore::new_key("png");
        assert_ne!(a, b);
        assert!(a.starts_with("recipes/"));
        assert!(a.ends_with(".png"));
    }
}
