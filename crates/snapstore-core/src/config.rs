//! Configuration bag for codec construction
//!
//! Deserializers are handed an opaque property bag at construction. The
//! current codec has no tunables and ignores it; the bag exists so a future
//! codec version can take tunables without changing the dispatcher surface.

use hashbrown::HashMap;

/// Opaque string key/value properties.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    values: HashMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self { values: HashMap::new() }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get() {
        let mut props = Properties::new();
        assert!(props.is_empty());

        props.set("read_buffer_size", "8192");
        assert_eq!(props.get("read_buffer_size"), Some("8192"));
        assert_eq!(props.get("missing"), None);
        assert_eq!(props.len(), 1);
    }
}
