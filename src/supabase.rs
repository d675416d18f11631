//! [`FlyStore`] over the hosted Postgres REST interface and object storage.

use crate::record::{DeletionRequest, Fly, FlyDetails, FlyId, NewFly, WaitlistEntry};
use crate::store::{FlyStore, StoreError};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

const FLIES: &str = "flies";
const WAITLIST: &str = "waitlist";
const DELETION_REQUESTS: &str = "data_deletion_requests";
/// Missing means null or empty: `""` for text, `{}` for array columns.
const INCOMPLETE_FILTER: &str = "(description.is.null,description.eq.,categories.is.null,categories.eq.{},season.is.null,season.eq.{})";

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    error: Option<String>,
}

pub struct SupabaseStore {
    client: Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseStore {
    pub fn new(base_url: &str, service_key: String, bucket: String) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            bucket,
        })
    }

    fn table(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    pub fn public_url(&self, object_name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, object_name
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .ok()
            .and_then(|body| body.message.or(body.error))
            .unwrap_or(text);
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, StoreError> {
        debug!("select {} {:?}", table, query);
        let request = self.authorized(self.client.get(self.table(table))).query(query);
        let response = Self::check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn patch_fly<T: serde::Serialize + ?Sized>(
        &self,
        id: &FlyId,
        body: &T,
    ) -> Result<(), StoreError> {
        let filter = format!("eq.{}", id);
        let request = self
            .authorized(self.client.patch(self.table(FLIES)))
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=minimal")
            .json(body);
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn insert<T: serde::Serialize + ?Sized>(
        &self,
        table: &str,
        rows: &T,
    ) -> Result<Response, StoreError> {
        let request = self
            .authorized(self.client.post(self.table(table)))
            .json(rows);
        Self::check(request.send().await?).await
    }
}

fn list_query(incomplete_only: bool) -> Vec<(&'static str, &'static str)> {
    let mut query = vec![("select", "*"), ("order", "name.asc")];
    if incomplete_only {
        query.push(("or", INCOMPLETE_FILTER));
    }
    query
}

#[async_trait]
impl FlyStore for SupabaseStore {
    async fn list_flies(&self, incomplete_only: bool) -> Result<Vec<Fly>, StoreError> {
        self.select(FLIES, &list_query(incomplete_only)).await
    }

    async fn get_fly(&self, id: &FlyId) -> Result<Option<Fly>, StoreError> {
        let filter = format!("eq.{}", id);
        let rows: Vec<Fly> = self
            .select(FLIES, &[("select", "*"), ("id", filter.as_str())])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Fly>, StoreError> {
        let filter = format!("eq.{}", name);
        let rows: Vec<Fly> = self
            .select(FLIES, &[("select", "*"), ("name", filter.as_str()), ("limit", "1")])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn search_by_name(&self, term: &str) -> Result<Vec<Fly>, StoreError> {
        let filter = format!("ilike.*{}*", term);
        self.select(
            FLIES,
            &[("select", "*"), ("name", filter.as_str()), ("order", "name.asc")],
        )
        .await
    }

    async fn all_names(&self) -> Result<Vec<String>, StoreError> {
        #[derive(Deserialize)]
        struct NameRow {
            name: String,
        }

        let rows: Vec<NameRow> = self.select(FLIES, &[("select", "name")]).await?;
        Ok(rows.into_iter().map(|row| row.name).collect())
    }

    async fn insert_flies(&self, flies: &[NewFly]) -> Result<Vec<Fly>, StoreError> {
        if flies.is_empty() {
            return Ok(Vec::new());
        }
        let request = self
            .authorized(self.client.post(self.table(FLIES)))
            .header("Prefer", "return=representation")
            .json(flies);
        let response = Self::check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn update_details(&self, id: &FlyId, details: &FlyDetails) -> Result<(), StoreError> {
        self.patch_fly(id, details).await
    }

    async fn set_image(&self, id: &FlyId, image_url: &str) -> Result<(), StoreError> {
        self.patch_fly(id, &json!({ "image_url": image_url })).await
    }

    async fn upload_image(
        &self,
        object_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StoreError> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, object_name
        );
        let request = self
            .authorized(self.client.post(url))
            .header("Content-Type", content_type)
            .body(bytes);
        Self::check(request.send().await?).await?;
        Ok(self.public_url(object_name))
    }

    async fn add_waitlist(&self, entry: &WaitlistEntry) -> Result<(), StoreError> {
        self.insert(WAITLIST, &[entry]).await?;
        Ok(())
    }

    async fn add_deletion_request(&self, request: &DeletionRequest) -> Result<(), StoreError> {
        self.insert(DELETION_REQUESTS, &[request]).await?;
        Ok(())
    }
}
