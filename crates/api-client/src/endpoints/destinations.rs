//! Destinations (`ausfluege` table)
//!
//! Read-only access used by the proximity pipeline:
//! - List every destination ordered by name
//! - Fetch a single destination by id (notification deep links)

use crate::client::SupabaseClient;
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Deserializer, Serialize};

/// Destinations API interface
#[derive(Clone)]
pub struct DestinationsApi {
    client: SupabaseClient,
}

impl DestinationsApi {
    /// Create a new destinations API interface
    pub(crate) fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// List all destinations
    ///
    /// GET /rest/v1/ausfluege?select=*&order=name.asc
    pub async fn list_all(&self) -> ApiResult<Vec<Destination>> {
        self.client.get("ausfluege?select=*&order=name.asc").await
    }

    /// Get a single destination by id
    ///
    /// GET /rest/v1/ausfluege?select=*&id=eq.<id>
    pub async fn get(&self, id: i64) -> ApiResult<Destination> {
        let rows: Vec<Destination> = self
            .client
            .get(&format!("ausfluege?select=*&id=eq.{id}"))
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ApiError::NotFound(format!("destination {id}")))
    }
}

/// A row of the `ausfluege` table
///
/// Only the columns the proximity pipeline and CLI display need are typed;
/// the rest of the row is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub beschreibung: Option<String>,
    #[serde(default)]
    pub adresse: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub land: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub kosten_stufe: Option<i32>,
    /// Latitude as stored (text column, occasionally numeric in exports)
    #[serde(default, deserialize_with = "text_or_number")]
    pub lat: Option<String>,
    /// Longitude as stored
    #[serde(default, deserialize_with = "text_or_number")]
    pub lng: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Destination {
    /// Minimal destination with coordinates, mostly for tests and fixtures
    pub fn new(id: i64, name: impl Into<String>, lat: Option<&str>, lng: Option<&str>) -> Self {
        Self {
            id,
            name: name.into(),
            beschreibung: None,
            adresse: None,
            region: None,
            land: None,
            website_url: None,
            kosten_stufe: None,
            lat: lat.map(str::to_string),
            lng: lng.map(str::to_string),
            created_at: None,
        }
    }
}

fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_deserialize_full_row() {
        let json = r#"{
            "id": 7,
            "user_id": null,
            "name": "Rheinfall",
            "beschreibung": "Grösster Wasserfall Europas",
            "adresse": "Rheinfallquai, 8212 Neuhausen",
            "land": "Schweiz",
            "region": "Schaffhausen",
            "kosten_stufe": 2,
            "lat": "47.6779",
            "lng": "8.6156",
            "created_at": "2024-05-01T10:00:00Z",
            "is_rundtour": false
        }"#;

        let dest: Destination = serde_json::from_str(json).unwrap();
        assert_eq!(dest.id, 7);
        assert_eq!(dest.name, "Rheinfall");
        assert_eq!(dest.lat.as_deref(), Some("47.6779"));
        assert_eq!(dest.kosten_stufe, Some(2));
    }

    #[test]
    fn test_destination_null_and_numeric_coordinates() {
        let dest: Destination =
            serde_json::from_str(r#"{"id": 1, "name": "A", "lat": null, "lng": 8.5}"#).unwrap();
        assert_eq!(dest.lat, None);
        assert_eq!(dest.lng.as_deref(), Some("8.5"));

        let dest: Destination = serde_json::from_str(r#"{"id": 2, "name": "B"}"#).unwrap();
        assert_eq!(dest.lat, None);
        assert_eq!(dest.lng, None);
    }
}
