//! In-memory stand-ins for the external services, for tests.

use crate::completion::{CompletionError, CompletionService};
use crate::image_search::{ImageHit, ImageSearch, SearchError};
use crate::record::{DeletionRequest, Fly, FlyDetails, FlyId, NewFly, WaitlistEntry};
use crate::store::{FlyStore, StoreError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

enum Reply {
    Text(String),
    Fail,
}

/// Answers prompts by substring: the first rule whose needle the prompt
/// contains wins.
pub struct ScriptedCompletion {
    rules: Vec<(String, Reply)>,
    latency: Duration,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn respond_to(mut self, needle: &str, reply: &str) -> Self {
        self.rules.push((needle.to_string(), Reply::Text(reply.to_string())));
        self
    }

    pub fn fail_on(mut self, needle: &str) -> Self {
        self.rules.push((needle.to_string(), Reply::Fail));
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }

    pub fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), Instant::now()));
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.rules.iter().find(|(needle, _)| prompt.contains(needle.as_str())) {
            Some((_, Reply::Text(text))) => Ok(text.clone()),
            Some((_, Reply::Fail)) => Err(CompletionError::RateLimited),
            None => Err(CompletionError::Empty),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub flies: Mutex<Vec<Fly>>,
    pub updates: Mutex<Vec<(FlyId, FlyDetails)>>,
    pub uploads: Mutex<Vec<(String, usize, String)>>,
    pub waitlist: Mutex<Vec<WaitlistEntry>>,
    pub deletions: Mutex<Vec<DeletionRequest>>,
    failing_updates: Mutex<HashSet<FlyId>>,
    calls: Mutex<usize>,
}

impl MemoryStore {
    pub fn with_names(names: &[&str]) -> Self {
        let store = Self::default();
        {
            let mut flies = store.flies.lock().unwrap();
            for (i, name) in names.iter().enumerate() {
                flies.push(Fly {
                    id: FlyId(format!("fly-{}", i + 1)),
                    name: name.to_string(),
                    ..Default::default()
                });
            }
        }
        store
    }

    pub fn fail_updates_for(&self, id: &FlyId) {
        self.failing_updates.lock().unwrap().insert(id.clone());
    }

    /// Number of store operations made so far.
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    pub fn fly(&self, id: &str) -> Option<Fly> {
        self.flies
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.id.0 == id)
            .cloned()
    }

    fn touch(&self) {
        *self.calls.lock().unwrap() += 1;
    }
}

#[async_trait]
impl FlyStore for MemoryStore {
    async fn list_flies(&self, incomplete_only: bool) -> Result<Vec<Fly>, StoreError> {
        self.touch();
        let mut flies: Vec<Fly> = self
            .flies
            .lock()
            .unwrap()
            .iter()
            .filter(|f| !incomplete_only || f.is_incomplete())
            .cloned()
            .collect();
        flies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(flies)
    }

    async fn get_fly(&self, id: &FlyId) -> Result<Option<Fly>, StoreError> {
        self.touch();
        Ok(self.fly(&id.0))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Fly>, StoreError> {
        self.touch();
        Ok(self
            .flies
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.name == name)
            .cloned())
    }

    async fn search_by_name(&self, term: &str) -> Result<Vec<Fly>, StoreError> {
        self.touch();
        let term = term.to_lowercase();
        let mut flies: Vec<Fly> = self
            .flies
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.name.to_lowercase().contains(&term))
            .cloned()
            .collect();
        flies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(flies)
    }

    async fn all_names(&self) -> Result<Vec<String>, StoreError> {
        self.touch();
        Ok(self.flies.lock().unwrap().iter().map(|f| f.name.clone()).collect())
    }

    async fn insert_flies(&self, new: &[NewFly]) -> Result<Vec<Fly>, StoreError> {
        self.touch();
        let mut flies = self.flies.lock().unwrap();
        let mut inserted = Vec::new();
        for fly in new {
            if flies.iter().any(|f| f.name == fly.name) {
                return Err(StoreError::Api {
                    status: 409,
                    message: "duplicate key value violates unique constraint".into(),
                });
            }
            let mut row = Fly {
                id: FlyId(format!("fly-{}", flies.len() + 1)),
                name: fly.name.clone(),
                image_url: fly.image_url.clone(),
                ..Default::default()
            };
            if let Some(details) = &fly.details {
                apply_details(&mut row, details);
            }
            flies.push(row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn update_details(&self, id: &FlyId, details: &FlyDetails) -> Result<(), StoreError> {
        self.touch();
        if self.failing_updates.lock().unwrap().contains(id) {
            return Err(StoreError::Api {
                status: 500,
                message: "update rejected".into(),
            });
        }
        let mut flies = self.flies.lock().unwrap();
        if let Some(row) = flies.iter_mut().find(|f| &f.id == id) {
            apply_details(row, details);
        }
        self.updates.lock().unwrap().push((id.clone(), details.clone()));
        Ok(())
    }

    async fn set_image(&self, id: &FlyId, image_url: &str) -> Result<(), StoreError> {
        self.touch();
        let mut flies = self.flies.lock().unwrap();
        if let Some(row) = flies.iter_mut().find(|f| &f.id == id) {
            row.image_url = Some(image_url.to_string());
        }
        Ok(())
    }

    async fn upload_image(
        &self,
        object_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StoreError> {
        self.touch();
        self.uploads.lock().unwrap().push((
            object_name.to_string(),
            bytes.len(),
            content_type.to_string(),
        ));
        Ok(format!("https://storage.test/fly-images/{}", object_name))
    }

    async fn add_waitlist(&self, entry: &WaitlistEntry) -> Result<(), StoreError> {
        self.touch();
        self.waitlist.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn add_deletion_request(&self, request: &DeletionRequest) -> Result<(), StoreError> {
        self.touch();
        self.deletions.lock().unwrap().push(request.clone());
        Ok(())
    }
}

fn apply_details(row: &mut Fly, details: &FlyDetails) {
    row.description = Some(details.description.clone());
    row.categories = details.categories.clone();
    row.season = details.season.iter().map(|s| s.to_string()).collect();
    row.water_type = details.water_type.iter().map(|w| w.to_string()).collect();
    row.weather_conditions = details
        .weather_conditions
        .iter()
        .map(|w| w.to_string())
        .collect();
    row.target_species = details.target_species.clone();
    row.temp_min = Some(details.temp_min);
    row.temp_max = Some(details.temp_max);
    row.season_start = Some(details.season_start);
    row.season_end = Some(details.season_end);
    row.depth = details.depth.map(|d| d.to_string());
}

pub struct StaticSearch {
    hits: Vec<ImageHit>,
    pub queries: Mutex<Vec<String>>,
}

impl StaticSearch {
    pub fn new(links: &[&str]) -> Self {
        Self {
            hits: links
                .iter()
                .map(|link| ImageHit {
                    link: link.to_string(),
                    title: String::new(),
                    thumbnail_link: None,
                })
                .collect(),
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ImageSearch for StaticSearch {
    async fn search(&self, query: &str) -> Result<Vec<ImageHit>, SearchError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.hits.clone())
    }
}
