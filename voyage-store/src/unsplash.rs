use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;
use voyage_core::supplier::PhotoSearch;
use voyage_shared::pii::Masked;

use crate::app_config::UnsplashConfig;

/// Destination skyline photos from Unsplash. Without an access key every
/// lookup resolves to no image.
pub struct UnsplashClient {
    http: Client,
    base_url: String,
    access_key: Option<Masked<String>>,
    app_id: Option<String>,
}

impl UnsplashClient {
    pub fn from_config(config: &UnsplashConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_key: config.access_key.clone().filter(|k| !k.is_blank()),
            app_id: config
                .app_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from),
        }
    }
}

fn search_query(city: &str) -> String {
    format!("{} city skyline travel", city)
}

/// `results[0].urls.regular`, else `.full`, with referral attribution when an app id is set.
fn photo_url(body: &Value, app_id: Option<&str>) -> Option<String> {
    let urls = &body["results"][0]["urls"];
    let url = urls["regular"]
        .as_str()
        .or_else(|| urls["full"].as_str())
        .filter(|u| !u.is_empty())?;

    let Some(app_id) = app_id else {
        return Some(url.to_string());
    };
    let Ok(mut attributed) = Url::parse(url) else {
        return Some(url.to_string());
    };
    attributed
        .query_pairs_mut()
        .append_pair("utm_source", app_id)
        .append_pair("utm_medium", "referral");
    Some(attributed.into())
}

#[async_trait]
impl PhotoSearch for UnsplashClient {
    async fn destination_image(
        &self,
        city: &str,
    ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
        let city = city.trim();
        let Some(access_key) = self.access_key.as_ref() else {
            return Ok(None);
        };
        if city.is_empty() {
            return Ok(None);
        }

        let query = search_query(city);
        let response = self
            .http
            .get(format!("{}/search/photos", self.base_url))
            .header("Authorization", format!("Client-ID {}", access_key.expose()))
            .header("Accept-Version", "v1")
            .query(&[
                ("query", query.as_str()),
                ("orientation", "landscape"),
                ("per_page", "1"),
                ("content_filter", "high"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        let url = photo_url(&body, self.app_id.as_deref());
        debug!(city, found = url.is_some(), "Destination image lookup");
        Ok(url)
    }
}
