use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{Group, GroupId, GroupWithSites, Site, SiteId},
    error::{ApiError, ApiException},
    protocol::{
        GroupOrderEntry, GroupPatch, NewGroup, NewSite, SiteOrderEntry, SitePatch, SuccessResponse,
    },
};
use tracing::debug;
use url::Url;

use crate::NavigationBackend;

pub struct HttpNavigationClient {
    http: Client,
    base_url: Url,
}

impl HttpNavigationClient {
    /// `base_url` is the API root, e.g. `http://localhost:8788/api`.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("invalid backend url '{base_url}'"))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid endpoint path '{path}'"))
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!(%method, %url, "backend: request");
        let mut request = self.http.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("{method} /{path}"))?;
        decode(response)
            .await
            .with_context(|| format!("{method} /{path}"))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiError>(&body) {
        Ok(api) => Err(ApiException::from(api).into()),
        Err(_) => Err(anyhow!("backend returned {status}")),
    }
}

#[async_trait]
impl NavigationBackend for HttpNavigationClient {
    async fn get_groups_with_sites(&self) -> Result<Vec<GroupWithSites>> {
        self.send::<(), _>(Method::GET, "groups-with-sites", None)
            .await
    }

    async fn update_group_order(&self, entries: &[GroupOrderEntry]) -> Result<bool> {
        let response: SuccessResponse = self
            .send(Method::PUT, "group-orders", Some(entries))
            .await?;
        Ok(response.success)
    }

    async fn update_site_order(&self, entries: &[SiteOrderEntry]) -> Result<bool> {
        let response: SuccessResponse = self
            .send(Method::PUT, "site-orders", Some(entries))
            .await?;
        Ok(response.success)
    }

    async fn update_site(&self, site_id: SiteId, patch: &SitePatch) -> Result<Site> {
        self.send(Method::PUT, &format!("sites/{}", site_id.0), Some(patch))
            .await
    }

    async fn create_group(&self, group: &NewGroup) -> Result<Group> {
        self.send(Method::POST, "groups", Some(group)).await
    }

    async fn update_group(&self, group_id: GroupId, patch: &GroupPatch) -> Result<Group> {
        self.send(Method::PUT, &format!("groups/{}", group_id.0), Some(patch))
            .await
    }

    async fn delete_group(&self, group_id: GroupId) -> Result<bool> {
        let response: SuccessResponse = self
            .send::<(), _>(Method::DELETE, &format!("groups/{}", group_id.0), None)
            .await?;
        Ok(response.success)
    }

    async fn create_site(&self, site: &NewSite) -> Result<Site> {
        self.send(Method::POST, "sites", Some(site)).await
    }

    async fn delete_site(&self, site_id: SiteId) -> Result<bool> {
        let response: SuccessResponse = self
            .send::<(), _>(Method::DELETE, &format!("sites/{}", site_id.0), None)
            .await?;
        Ok(response.success)
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
