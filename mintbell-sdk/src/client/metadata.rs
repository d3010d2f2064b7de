use alloy_primitives::U256;
use reqwest::Client;
use url::Url;

use super::{ClientError, parse_response};
use crate::objects::{TokenMetadata, metadata_path};

/// Client for the collection's static metadata service.
#[derive(Debug, Clone)]
pub struct MetadataClient {
    http: Client,
    base_url: Url,
}

impl MetadataClient {
    /// * `base_url` – root of the metadata service; documents are read from
    ///   `{base_url}/data/{id:0000}.json`.
    pub fn new(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn document_url(&self, token_id: U256) -> Result<Url, ClientError> {
        Ok(self.base_url.join(&metadata_path(token_id))?)
    }

    /// `GET {base}/data/{id:0000}.json`
    pub async fn fetch(&self, token_id: U256) -> Result<TokenMetadata, ClientError> {
        let url = self.document_url(token_id)?;
        let resp = self.http.get(url).send().await?;
        parse_response(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_url_keeps_base_path() {
        let client = MetadataClient::new(
            Client::new(),
            Url::parse("https://example.com/collection/").unwrap(),
        );
        let url = client.document_url(U256::from(42)).unwrap();
        assert_eq!(url.as_str(), "https://example.com/collection/data/0042.json");
    }
}
