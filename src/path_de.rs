use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::LoadError;

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, LoadError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| LoadError::Decode {
        path: err.path().to_string(),
        message: err.into_inner().to_string(),
    })
}

pub fn from_file_with_path<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let src = std::fs::read_to_string(path)?;
    from_str_with_path(&src)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::SchemaNode;

    #[test]
    fn errors_point_at_the_bad_node() {
        let src = r#"{
            "type": "object",
            "entries": {
                "tags": { "type": "array", "item": { "type": "union" } }
            }
        }"#;
        let err = from_str_with_path::<SchemaNode>(src).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("entries.tags.item"), "{text}");
        assert!(text.contains("`options`"), "{text}");
    }
}
