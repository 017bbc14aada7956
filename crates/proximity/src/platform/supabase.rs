//! Destination catalog backed by the Supabase `ausfluege` table

use super::DestinationSource;
use crate::error::Result;
use ausflug_api_client::{endpoints::DestinationsApi, Destination, SupabaseClient};
use async_trait::async_trait;

#[async_trait]
impl DestinationSource for DestinationsApi {
    async fn all_destinations(&self) -> Result<Vec<Destination>> {
        Ok(self.list_all().await?)
    }
}

#[async_trait]
impl DestinationSource for SupabaseClient {
    async fn all_destinations(&self) -> Result<Vec<Destination>> {
        self.destinations().all_destinations().await
    }
}
