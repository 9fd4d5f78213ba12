//! HTTP client for menu-server
//!
//! [`HttpClient`] is the verb-level seam; [`MenuSource`] and
//! [`VersionSource`] are the narrow views the store and the change
//! detector depend on, so both can be driven by in-memory fakes in tests.

use crate::video::VideoMappings;
use crate::{ClientConfig, ClientError, ClientResult};
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use shared::models::{CategoryCreate, EventCreate, EventUpdate, ProductCreate};
use shared::models::{
    LanguageSetting, NavigationSettings, SocialLink, VideoMappingList, WifiSettings,
};
use shared::{
    ApiResponse, Category, DeleteResponse, Event, HealthResponse, LoginRequest, LoginResponse,
    MenuDocument, Product, VersionCheck,
};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Percent-encode one path segment
fn segment(id: &str) -> Cow<'_, str> {
    urlencoding::encode(id)
}

/// Source of the full menu document
#[async_trait]
pub trait MenuSource: Send + Sync {
    async fn fetch_menu(&self) -> ClientResult<MenuDocument>;
}

/// Source of the raw version-check payload
#[async_trait]
pub trait VersionSource: Send + Sync {
    async fn fetch_version(&self) -> ClientResult<Value>;
}

#[async_trait]
impl<T: MenuSource + ?Sized> MenuSource for Arc<T> {
    async fn fetch_menu(&self) -> ClientResult<MenuDocument> {
        (**self).fetch_menu().await
    }
}

#[async_trait]
impl<T: VersionSource + ?Sized> VersionSource for Arc<T> {
    async fn fetch_version(&self) -> ClientResult<Value> {
        (**self).fetch_version().await
    }
}

/// HTTP verbs against menu-server
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T>;
    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T>;
    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T>;
    async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T>;
    fn token(&self) -> Option<&str>;
}

/// reqwest-backed client
#[derive(Debug, Clone)]
pub struct NetworkHttpClient {
    client: Client,
    base_url: String,
    products_url: String,
    version_url: String,
    token: Option<String>,
}

impl NetworkHttpClient {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Self::from_config(&ClientConfig::new(base_url))
    }

    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            products_url: config.products_url(),
            version_url: config.version_check_url(),
            token: config.token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set the authentication token
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(t) => req.bearer_auth(t),
            None => req,
        }
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> ClientResult<T> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            if let Ok(ApiResponse::<Value> {
                code: Some(code),
                message,
                details,
                ..
            }) = serde_json::from_str(&text)
            {
                return Err(ClientError::Api {
                    code,
                    message,
                    details: details.map(|d| Value::Object(d.into_iter().collect())),
                });
            }
            return match status {
                StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(text)),
                StatusCode::BAD_REQUEST => Err(ClientError::Validation(text)),
                _ => Err(ClientError::Status {
                    status: status.as_u16(),
                    body: text,
                }),
            };
        }
        Ok(response.json().await?)
    }

    // ========== Public API ==========

    pub async fn health(&self) -> ClientResult<HealthResponse> {
        self.get("api/health").await
    }

    pub async fn version_check(&self) -> ClientResult<VersionCheck> {
        let raw = self.fetch_version().await?;
        Ok(serde_json::from_value(raw)?)
    }

    pub async fn events(&self) -> ClientResult<Vec<Event>> {
        self.get("api/events").await
    }

    pub async fn upcoming_events(&self) -> ClientResult<Vec<Event>> {
        self.get("api/events/active").await
    }

    /// Server-side video mappings; invalid rows are dropped
    pub async fn fetch_video_mappings(&self) -> ClientResult<VideoMappings> {
        let response = self
            .client
            .get(&self.products_url)
            .query(&[("action", "get_video_mappings")])
            .send()
            .await?;
        let list: VideoMappingList = self.handle_response(response).await?;
        if list.status != VideoMappingList::SUCCESS {
            tracing::warn!(status = %list.status, "Video mappings not served");
            return Ok(VideoMappings::new());
        }
        Ok(VideoMappings::from_server(&list.mappings))
    }

    /// Replace the server's video table; returns what it now serves
    pub async fn replace_video_mappings(
        &self,
        table: &BTreeMap<String, String>,
    ) -> ClientResult<VideoMappings> {
        let list: VideoMappingList = self.put("api/settings/videos", table).await?;
        Ok(VideoMappings::from_server(&list.mappings))
    }

    pub async fn navigation_settings(&self) -> ClientResult<NavigationSettings> {
        self.get("api/settings/navigation").await
    }

    pub async fn update_navigation_settings(
        &self,
        settings: &NavigationSettings,
    ) -> ClientResult<NavigationSettings> {
        self.put("api/settings/navigation", settings).await
    }

    pub async fn wifi(&self) -> ClientResult<WifiSettings> {
        self.get("api/settings/wifi").await
    }

    pub async fn enabled_languages(&self) -> ClientResult<Vec<LanguageSetting>> {
        self.get("api/settings/languages").await
    }

    pub async fn enabled_social_links(&self) -> ClientResult<Vec<SocialLink>> {
        self.get("api/settings/social").await
    }

    // ========== Admin API ==========

    /// Log in and keep the returned token for later calls
    pub async fn login(&mut self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        let req = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let resp: LoginResponse = self.post("api/auth/login", &req).await?;
        self.token = Some(resp.token.clone());
        Ok(resp)
    }

    pub async fn replace_menu(&self, doc: &MenuDocument) -> ClientResult<MenuDocument> {
        self.put("api/products", doc).await
    }

    pub async fn add_product(
        &self,
        category_id: &str,
        product: &ProductCreate,
    ) -> ClientResult<Product> {
        self.post(&format!("api/products/{}/items", segment(category_id)), product)
            .await
    }

    pub async fn update_product(
        &self,
        category_id: &str,
        item_id: &str,
        patch: &Map<String, Value>,
    ) -> ClientResult<Product> {
        self.put(
            &format!(
                "api/products/{}/items/{}",
                segment(category_id),
                segment(item_id)
            ),
            patch,
        )
        .await
    }

    pub async fn delete_product(
        &self,
        category_id: &str,
        item_id: &str,
    ) -> ClientResult<DeleteResponse> {
        self.delete(&format!(
            "api/products/{}/items/{}",
            segment(category_id),
            segment(item_id)
        ))
            .await
    }

    pub async fn move_product(
        &self,
        from_category: &str,
        item_id: &str,
        to_category: &str,
    ) -> ClientResult<Product> {
        self.put(
            &format!(
                "api/products/move/{}/{}/{}",
                segment(from_category),
                segment(item_id),
                segment(to_category)
            ),
            &Value::Null,
        )
        .await
    }

    pub async fn create_category(&self, category: &CategoryCreate) -> ClientResult<Category> {
        self.post("api/categories", category).await
    }

    pub async fn update_category(
        &self,
        id: &str,
        patch: &Map<String, Value>,
    ) -> ClientResult<Category> {
        self.put(&format!("api/categories/{}", segment(id)), patch).await
    }

    pub async fn delete_category(&self, id: &str) -> ClientResult<DeleteResponse> {
        self.delete(&format!("api/categories/{}", segment(id))).await
    }

    pub async fn create_event(&self, event: &EventCreate) -> ClientResult<Event> {
        self.post("api/events", event).await
    }

    pub async fn update_event(&self, id: &str, update: &EventUpdate) -> ClientResult<Event> {
        self.put(&format!("api/events/{}", segment(id)), update).await
    }

    pub async fn delete_event(&self, id: &str) -> ClientResult<DeleteResponse> {
        self.delete(&format!("api/events/{}", segment(id))).await
    }
}

#[async_trait]
impl HttpClient for NetworkHttpClient {
    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let req = self.authorized(self.client.get(self.url(path)));
        let response = req.send().await?;
        self.handle_response(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let req = self.authorized(self.client.post(self.url(path)).json(body));
        let response = req.send().await?;
        self.handle_response(response).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let req = self.authorized(self.client.put(self.url(path)).json(body));
        let response = req.send().await?;
        self.handle_response(response).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let req = self.authorized(self.client.delete(self.url(path)));
        let response = req.send().await?;
        self.handle_response(response).await
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

#[async_trait]
impl MenuSource for NetworkHttpClient {
    async fn fetch_menu(&self) -> ClientResult<MenuDocument> {
        let response = self.client.get(&self.products_url).send().await?;
        self.handle_response(response).await
    }
}

#[async_trait]
impl VersionSource for NetworkHttpClient {
    async fn fetch_version(&self) -> ClientResult<Value> {
        let response = self
            .client
            .get(&self.version_url)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;
        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = NetworkHttpClient::new("http://localhost:3001/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:3001");
        assert_eq!(client.url("/api/health"), "http://localhost:3001/api/health");
        assert_eq!(client.url("api/events"), "http://localhost:3001/api/events");
        assert_eq!(
            client.version_url,
            "http://localhost:3001/api/products?action=version_check"
        );
    }

    #[test]
    fn test_path_segments_are_encoded() {
        assert_eq!(segment("shisha"), "shisha");
        assert_eq!(segment("a/b?c#d"), "a%2Fb%3Fc%23d");
        assert_eq!(segment("tee kaffee"), "tee%20kaffee");
    }

    #[test]
    fn test_token_from_config() {
        let config = ClientConfig::new("http://localhost:3001").with_token("abc");
        let mut client = NetworkHttpClient::from_config(&config).unwrap();
        assert_eq!(client.token(), Some("abc"));
        client.set_token(None);
        assert_eq!(client.token(), None);
    }
}
