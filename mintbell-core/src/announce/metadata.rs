use alloy_primitives::U256;
use async_trait::async_trait;
use mintbell_sdk::client::MetadataClient;
use mintbell_sdk::objects::TokenMetadata;

use super::{MetadataError, MetadataSource};

#[async_trait]
impl MetadataSource for MetadataClient {
    async fn fetch(&self, token_id: U256) -> Result<TokenMetadata, MetadataError> {
        Ok(MetadataClient::fetch(self, token_id).await?)
    }
}
