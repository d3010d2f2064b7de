use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// Token metadata document served at `data/{id:0000}.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Relative path of the metadata document for `token_id`.
///
/// Ids are zero-padded to four digits; longer ids are kept as-is.
pub fn metadata_path(token_id: U256) -> String {
    format!("data/{:0>4}.json", token_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_path_padding() {
        assert_eq!(metadata_path(U256::from(7)), "data/0007.json");
        assert_eq!(metadata_path(U256::from(340)), "data/0340.json");
        assert_eq!(metadata_path(U256::from(12345)), "data/12345.json");
    }

    #[test]
    fn test_metadata_without_image() {
        let meta: TokenMetadata = serde_json::from_str(r#"{"name":"Pluggy #7"}"#).unwrap();
        assert_eq!(meta.name, "Pluggy #7");
        assert_eq!(meta.image, None);
    }
}
