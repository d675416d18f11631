//! Admin operations on the fly catalog.
//!
//! Each operation is a short sequence of calls to the hosted store and, where
//! needed, the completion or image search services. Results come back as
//! values; turning failures into a [`StatusMessage`] is left to the caller.

use crate::completion::CompletionService;
use crate::config::ConfigError;
use crate::draft::{DetailsPatch, FlyDraft};
use crate::error::{AppError, StatusMessage, ValidationError};
use crate::image_search::{ImageHit, ImageSearch, fly_query};
use crate::pipeline::describe_and_classify;
use crate::record::{DeletionRequest, DeletionStatus, Fly, FlyDetails, FlyId, NewFly, WaitlistEntry};
use crate::season::Month;
use crate::store::{FlyStore, content_type_for, extension_from_url, object_name};
use log::info;
use reqwest::Client;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct ImageSearchOutcome {
    pub fly: Option<Fly>,
    pub hits: Vec<ImageHit>,
    pub message: Option<StatusMessage>,
}

#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn FlyStore>,
    completion: Option<Arc<dyn CompletionService>>,
    search: Option<Arc<dyn ImageSearch>>,
    http: Client,
}

/// Names from an import box: one per line, trimmed, blanks dropped.
pub fn parse_import_names(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read an import file. A `.csv` file contributes the first column of each
/// row after the header; anything else is read as plain text.
pub fn read_import_file(path: &Path) -> Result<String, AppError> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Ok(std::fs::read_to_string(path)?);
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut names = Vec::new();
    for record in reader.records() {
        if let Some(name) = record?.get(0) {
            names.push(name.to_string());
        }
    }
    Ok(names.join("\n"))
}

fn validate_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email.to_string()),
        _ => Err(ValidationError::InvalidEmail),
    }
}

impl Catalog {
    pub fn new(store: Arc<dyn FlyStore>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            store,
            completion: None,
            search: None,
            http,
        }
    }

    pub fn with_completion(mut self, completion: Arc<dyn CompletionService>) -> Self {
        self.completion = Some(completion);
        self
    }

    pub fn with_image_search(mut self, search: Arc<dyn ImageSearch>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn store(&self) -> Arc<dyn FlyStore> {
        Arc::clone(&self.store)
    }

    pub fn completion(&self) -> Result<Arc<dyn CompletionService>, AppError> {
        self.completion
            .clone()
            .ok_or(AppError::Config(ConfigError::Missing("OPENAI_API_KEY")))
    }

    fn image_search(&self) -> Result<&dyn ImageSearch, AppError> {
        self.search
            .as_deref()
            .ok_or(AppError::Config(ConfigError::Missing("GOOGLE_API_KEY")))
    }

    /// Flies ordered by name. With `month`, only flies whose season window
    /// covers that month.
    pub async fn list_flies(
        &self,
        include_complete: bool,
        month: Option<u8>,
    ) -> Result<Vec<Fly>, AppError> {
        let month = month.map(Month::new).transpose()?;
        let flies = self.store.list_flies(!include_complete).await?;
        let Some(month) = month else {
            return Ok(flies);
        };
        Ok(flies
            .into_iter()
            .filter(|fly| fly.season_window().is_some_and(|w| w.is_active(month)))
            .collect())
    }

    async fn fly(&self, id: &FlyId) -> Result<Fly, AppError> {
        self.store
            .get_fly(id)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    /// Upload a picture for a fly by name. An unknown name creates the fly.
    pub async fn upload_image(
        &self,
        name: &str,
        bytes: Vec<u8>,
        extension: &str,
    ) -> Result<StatusMessage, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName.into());
        }
        if bytes.is_empty() {
            return Err(ValidationError::Other("Please select an image".into()).into());
        }

        let object = object_name(extension);
        let public_url = self
            .store
            .upload_image(&object, bytes, content_type_for(extension))
            .await?;

        match self.store.find_by_name(name).await? {
            Some(existing) => {
                self.store.set_image(&existing.id, &public_url).await?;
                info!("Updated image for {} ({})", name, existing.id);
                Ok(StatusMessage::success("Fly image updated successfully!"))
            }
            None => {
                let new_fly = NewFly {
                    image_url: Some(public_url),
                    ..NewFly::stub(name)
                };
                self.store.insert_flies(&[new_fly]).await?;
                info!("Added new fly {} with image", name);
                Ok(StatusMessage::success("New fly added successfully!"))
            }
        }
    }

    /// Add name-only flies for every new name in `text`. Names already in the
    /// catalog, compared case-insensitively, are skipped.
    pub async fn bulk_import(&self, text: &str) -> Result<StatusMessage, AppError> {
        let names = parse_import_names(text);
        let mut seen: HashSet<String> = self
            .store
            .all_names()
            .await?
            .into_iter()
            .map(|n| n.to_lowercase())
            .collect();

        let new_names: Vec<&String> = names
            .iter()
            .filter(|name| seen.insert(name.to_lowercase()))
            .collect();

        if new_names.is_empty() {
            return Ok(StatusMessage::success("All flies already exist in the database."));
        }

        let stubs: Vec<NewFly> = new_names.iter().map(|name| NewFly::stub(*name)).collect();
        self.store.insert_flies(&stubs).await?;
        info!("Imported {} new flies", stubs.len());

        Ok(StatusMessage::success(format!(
            "Successfully added {} new flies. {} were already in the database.",
            new_names.len(),
            names.len() - new_names.len()
        )))
    }

    /// Find the first fly matching `term`, then search pictures for it.
    pub async fn search_images(&self, term: &str) -> Result<ImageSearchOutcome, AppError> {
        let search = self.image_search()?;
        let term = term.trim();
        let fly = match self.store.search_by_name(term).await?.into_iter().next() {
            Some(fly) if !term.is_empty() => fly,
            _ => {
                return Ok(ImageSearchOutcome {
                    fly: None,
                    hits: Vec::new(),
                    message: Some(StatusMessage::success("No flies found with that name")),
                });
            }
        };

        let hits = search.search(&fly_query(&fly.name)).await?;
        let message = hits
            .is_empty()
            .then(|| StatusMessage::success("No images found"));
        Ok(ImageSearchOutcome {
            fly: Some(fly),
            hits,
            message,
        })
    }

    /// Copy a searched picture into the image bucket and point the fly at it.
    pub async fn select_image(&self, id: &FlyId, image_url: &str) -> Result<StatusMessage, AppError> {
        let fly = self.fly(id).await?;

        let response = self.http.get(image_url).send().await?.error_for_status()?;
        let extension = extension_from_url(image_url);
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(content_type_for(&extension))
            .to_string();
        let bytes = response.bytes().await?.to_vec();

        let public_url = self
            .store
            .upload_image(&object_name(&extension), bytes, &content_type)
            .await?;
        self.store.set_image(&fly.id, &public_url).await?;
        info!("Selected new image for {}", fly.name);

        Ok(StatusMessage::success("Image updated successfully!"))
    }

    /// Insert a fully specified fly from the admin form.
    pub async fn create_fly(&self, draft: &FlyDraft) -> Result<Fly, AppError> {
        draft.validate()?;
        let mut inserted = self.store.insert_flies(&[draft.to_new_fly()]).await?;
        inserted
            .pop()
            .ok_or_else(|| AppError::NotFound(draft.name().to_string()))
    }

    /// Run classification for one fly and return the result for review.
    /// Nothing is written.
    pub async fn enrich_fly(&self, id: &FlyId) -> Result<FlyDetails, AppError> {
        let completion = self.completion()?;
        let fly = self.fly(id).await?;
        Ok(describe_and_classify(completion.as_ref(), &fly.name).await?)
    }

    /// Write reviewed details. Validation happens before any store call.
    pub async fn save_details(
        &self,
        id: &FlyId,
        details: &FlyDetails,
    ) -> Result<StatusMessage, AppError> {
        details.temperature().validate()?;
        self.store.update_details(id, details).await?;
        Ok(StatusMessage::success("Details saved successfully!"))
    }

    /// Apply field edits to a stored fly and save the result. A new image
    /// URL is written with the details; renames and image removal are
    /// rejected before anything is written.
    pub async fn edit_fly(
        &self,
        id: &FlyId,
        patches: Vec<DetailsPatch>,
    ) -> Result<FlyDraft, AppError> {
        let fly = self.fly(id).await?;
        let draft = FlyDraft::from_fly(&fly).apply_all(patches)?;

        if draft.name() != fly.name {
            return Err(ValidationError::RenameUnsupported.into());
        }
        let new_image = match (draft.image_url(), fly.image_url.as_deref()) {
            (None, Some(_)) => return Err(ValidationError::ImageRemovalUnsupported.into()),
            (Some(new), old) if Some(new) != old => Some(new),
            _ => None,
        };

        self.store.update_details(id, &draft.details()).await?;
        if let Some(url) = new_image {
            self.store.set_image(id, url).await?;
            info!("Updated image of {}", fly.name);
        }
        Ok(draft)
    }

    pub async fn join_waitlist(
        &self,
        name: Option<String>,
        email: &str,
    ) -> Result<StatusMessage, AppError> {
        let entry = WaitlistEntry {
            name: name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            email: validate_email(email)?,
        };
        self.store.add_waitlist(&entry).await?;
        Ok(StatusMessage::success("Successfully joined the waitlist!"))
    }

    pub async fn request_data_deletion(&self, email: &str) -> Result<StatusMessage, AppError> {
        let request = DeletionRequest {
            email: validate_email(email)?,
            status: DeletionStatus::Pending,
        };
        self.store.add_deletion_request(&request).await?;
        Ok(StatusMessage::success(
            "Your data deletion request has been submitted. We will process it within 30 days and send you a confirmation email.",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, ScriptedCompletion, StaticSearch};
    use std::collections::BTreeSet;

    fn catalog(store: &Arc<MemoryStore>) -> Catalog {
        Catalog::new(store.clone())
    }

    fn details(min: f64, max: f64) -> FlyDetails {
        FlyDetails {
            description: "A buoyant dry fly.".into(),
            categories: vec!["Dry Fly".into()],
            season: BTreeSet::new(),
            water_type: BTreeSet::new(),
            weather_conditions: BTreeSet::new(),
            target_species: vec![],
            temp_min: min,
            temp_max: max,
            season_start: Month::MARCH,
            season_end: Month::SEPTEMBER,
            depth: None,
        }
    }

    #[test]
    fn test_parse_import_names() {
        assert_eq!(
            parse_import_names("Adams\n\n  Woolly Bugger  \r\nRoyal Wulff\n"),
            vec!["Adams", "Woolly Bugger", "Royal Wulff"]
        );
    }

    #[test]
    fn test_read_import_file_text_and_csv() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("flies.txt");
        std::fs::write(&text, "Adams\nZug Bug\n").unwrap();
        assert_eq!(read_import_file(&text).unwrap(), "Adams\nZug Bug\n");

        let csv = dir.path().join("flies.CSV");
        std::fs::write(&csv, "name,size\nAdams,14\n\"Woolly Bugger, olive\",8\n").unwrap();
        let names = read_import_file(&csv).unwrap();
        assert_eq!(parse_import_names(&names), vec!["Adams", "Woolly Bugger, olive"]);
    }

    #[tokio::test]
    async fn test_bulk_import_skips_existing_case_insensitively() {
        let store = Arc::new(MemoryStore::with_names(&["Adams"]));
        let message = catalog(&store)
            .bulk_import("adams\nWoolly Bugger\nwoolly bugger\nRoyal Wulff")
            .await
            .unwrap();

        assert_eq!(
            message.message,
            "Successfully added 2 new flies. 2 were already in the database."
        );
        assert!(!message.is_error());
        let names: Vec<String> = store.flies.lock().unwrap().iter().map(|f| f.name.clone()).collect();
        assert_eq!(names, vec!["Adams", "Woolly Bugger", "Royal Wulff"]);
    }

    #[tokio::test]
    async fn test_bulk_import_all_existing() {
        let store = Arc::new(MemoryStore::with_names(&["Adams"]));
        let message = catalog(&store).bulk_import("ADAMS\n").await.unwrap();
        assert_eq!(message.message, "All flies already exist in the database.");
    }

    #[tokio::test]
    async fn test_upload_image_updates_existing_or_inserts() {
        let store = Arc::new(MemoryStore::with_names(&["Adams"]));
        let catalog = catalog(&store);

        let updated = catalog.upload_image("Adams", vec![1, 2, 3], "png").await.unwrap();
        assert_eq!(updated.message, "Fly image updated successfully!");
        let image = store.fly("fly-1").unwrap().image_url.unwrap();
        assert!(image.ends_with(".png"));

        let added = catalog.upload_image("Parachute Adams", vec![9], "jpg").await.unwrap();
        assert_eq!(added.message, "New fly added successfully!");
        assert_eq!(store.flies.lock().unwrap().len(), 2);

        let uploads = store.uploads.lock().unwrap();
        assert_eq!(uploads[0].2, "image/png");
        assert_eq!(uploads[1].2, "image/jpeg");
    }

    #[tokio::test]
    async fn test_upload_without_bytes_is_rejected_before_store() {
        let store = Arc::new(MemoryStore::default());
        let result = catalog(&store).upload_image("Adams", Vec::new(), "png").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_save_details_rejects_inverted_temperature_without_store_call() {
        let store = Arc::new(MemoryStore::with_names(&["Adams"]));
        let result = catalog(&store)
            .save_details(&FlyId::from("fly-1"), &details(25.0, 5.0))
            .await;

        let err = result.unwrap_err();
        assert!(!StatusMessage::error(&err).message.is_empty());
        assert!(matches!(err, AppError::Validation(ValidationError::TemperatureOrder { .. })));
        assert_eq!(store.call_count(), 0);
        assert!(store.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_details_writes_by_id() {
        let store = Arc::new(MemoryStore::with_names(&["Adams", "Zug Bug"]));
        let message = catalog(&store)
            .save_details(&FlyId::from("fly-2"), &details(5.0, 25.0))
            .await
            .unwrap();
        assert_eq!(message.message, "Details saved successfully!");
        assert_eq!(store.updates.lock().unwrap()[0].0, FlyId::from("fly-2"));
        assert_eq!(
            store.fly("fly-2").unwrap().description.as_deref(),
            Some("A buoyant dry fly.")
        );
    }

    #[tokio::test]
    async fn test_create_fly_inserts_full_record() {
        let store = Arc::new(MemoryStore::default());
        let draft = FlyDraft::new("Elk Hair Caddis")
            .unwrap()
            .apply(DetailsPatch::Description("Caddis imitation.".into()))
            .unwrap();
        let fly = catalog(&store).create_fly(&draft).await.unwrap();
        assert_eq!(fly.name, "Elk Hair Caddis");
        assert_eq!(fly.description.as_deref(), Some("Caddis imitation."));
    }

    #[tokio::test]
    async fn test_edit_fly_applies_patches() {
        let store = Arc::new(MemoryStore::with_names(&["Adams"]));
        let draft = catalog(&store)
            .edit_fly(
                &FlyId::from("fly-1"),
                vec![DetailsPatch::Temperature { min: 4.0, max: 14.0 }],
            )
            .await
            .unwrap();
        assert_eq!(draft.details().temp_max, 14.0);
        assert_eq!(store.fly("fly-1").unwrap().temp_max, Some(14.0));
    }

    #[tokio::test]
    async fn test_edit_fly_invalid_patch_writes_nothing() {
        let store = Arc::new(MemoryStore::with_names(&["Adams"]));
        let result = catalog(&store)
            .edit_fly(
                &FlyId::from("fly-1"),
                vec![DetailsPatch::Temperature { min: 14.0, max: 4.0 }],
            )
            .await;
        assert!(result.is_err());
        assert!(store.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_edit_fly_rejects_rename_before_writing() {
        let store = Arc::new(MemoryStore::with_names(&["Adams"]));
        let err = catalog(&store)
            .edit_fly(
                &FlyId::from("fly-1"),
                vec![
                    DetailsPatch::Description("Mayfly dun.".into()),
                    DetailsPatch::Name("Parachute Adams".into()),
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::RenameUnsupported)));
        assert!(store.updates.lock().unwrap().is_empty());
        assert_eq!(store.fly("fly-1").unwrap().name, "Adams");
    }

    #[tokio::test]
    async fn test_edit_fly_writes_new_image_url() {
        let store = Arc::new(MemoryStore::with_names(&["Adams"]));
        catalog(&store)
            .edit_fly(
                &FlyId::from("fly-1"),
                vec![DetailsPatch::ImageUrl(Some("https://img.test/adams.jpg".into()))],
            )
            .await
            .unwrap();
        assert_eq!(
            store.fly("fly-1").unwrap().image_url.as_deref(),
            Some("https://img.test/adams.jpg")
        );
        assert_eq!(store.updates.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_edit_fly_rejects_image_removal() {
        let store = Arc::new(MemoryStore::with_names(&["Adams"]));
        store.flies.lock().unwrap()[0].image_url = Some("https://img.test/old.jpg".into());

        let err = catalog(&store)
            .edit_fly(&FlyId::from("fly-1"), vec![DetailsPatch::ImageUrl(None)])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::ImageRemovalUnsupported)));
        assert!(store.updates.lock().unwrap().is_empty());
        assert_eq!(
            store.fly("fly-1").unwrap().image_url.as_deref(),
            Some("https://img.test/old.jpg")
        );
    }

    #[tokio::test]
    async fn test_list_flies_in_season() {
        let store = Arc::new(MemoryStore::with_names(&["Adams", "Midge", "Hopper"]));
        {
            let mut flies = store.flies.lock().unwrap();
            flies[1].season_start = Some(Month::new(11).unwrap());
            flies[1].season_end = Some(Month::new(2).unwrap());
            flies[2].season_start = Some(Month::new(6).unwrap());
            flies[2].season_end = Some(Month::new(9).unwrap());
        }
        let catalog = catalog(&store);

        let january: Vec<String> = catalog
            .list_flies(true, Some(1))
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(january, vec!["Midge"]);
        assert_eq!(catalog.list_flies(true, None).await.unwrap().len(), 3);

        let err = catalog.list_flies(true, Some(13)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::MonthOutOfRange(13))));
    }

    /// Local image host for downloads. `/plain.png` sends no content type.
    async fn spawn_image_host() -> String {
        use axum::{Router, http::header, response::IntoResponse, routing::get};

        let host = Router::new()
            .route(
                "/flies/adams.webp",
                get(|| async { ([(header::CONTENT_TYPE, "image/webp")], vec![7u8; 4]) }),
            )
            .route(
                "/plain.png",
                get(|| async {
                    let mut response = vec![1u8, 2].into_response();
                    response.headers_mut().remove(header::CONTENT_TYPE);
                    response
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, host).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_select_image_copies_into_bucket() {
        let base = spawn_image_host().await;
        let store = Arc::new(MemoryStore::with_names(&["Adams", "Zug Bug"]));
        let catalog = catalog(&store);

        let message = catalog
            .select_image(&FlyId::from("fly-2"), &format!("{}/flies/adams.webp?w=640", base))
            .await
            .unwrap();
        assert_eq!(message.message, "Image updated successfully!");
        assert!(!message.is_error());

        let (object, size, content_type) = store.uploads.lock().unwrap()[0].clone();
        assert!(object.ends_with(".webp"));
        assert_eq!((size, content_type.as_str()), (4, "image/webp"));
        let image = store.fly("fly-2").unwrap().image_url.unwrap();
        assert!(image.ends_with(&object));
        assert!(store.fly("fly-1").unwrap().image_url.is_none());
    }

    #[tokio::test]
    async fn test_select_image_content_type_from_extension() {
        let base = spawn_image_host().await;
        let store = Arc::new(MemoryStore::with_names(&["Adams"]));
        catalog(&store)
            .select_image(&FlyId::from("fly-1"), &format!("{}/plain.png", base))
            .await
            .unwrap();
        let (object, _, content_type) = store.uploads.lock().unwrap()[0].clone();
        assert!(object.ends_with(".png"));
        assert_eq!(content_type, "image/png");
    }

    #[tokio::test]
    async fn test_select_image_failed_download_writes_nothing() {
        let base = spawn_image_host().await;
        let store = Arc::new(MemoryStore::with_names(&["Adams"]));
        let err = catalog(&store)
            .select_image(&FlyId::from("fly-1"), &format!("{}/missing.jpg", base))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Download(_)));
        assert!(store.uploads.lock().unwrap().is_empty());
        assert!(store.fly("fly-1").unwrap().image_url.is_none());
    }

    #[tokio::test]
    async fn test_select_image_unknown_fly() {
        let store = Arc::new(MemoryStore::default());
        let err = catalog(&store)
            .select_image(&FlyId::from("fly-9"), "http://127.0.0.1:1/a.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_enrich_fly_returns_details_without_writing() {
        let store = Arc::new(MemoryStore::with_names(&["Adams"]));
        let completion = ScriptedCompletion::new()
            .respond_to("provide a detailed description", "A classic dry fly.")
            .respond_to("Provide specific details", "Categories: \"Dry Fly\"\nSeason: Summer");
        let catalog = catalog(&store).with_completion(Arc::new(completion));

        let details = catalog.enrich_fly(&FlyId::from("fly-1")).await.unwrap();
        assert_eq!(details.description, "A classic dry fly.");
        assert_eq!(details.categories, vec!["Dry Fly"]);
        assert!(store.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_enrich_without_completion_configured() {
        let store = Arc::new(MemoryStore::with_names(&["Adams"]));
        let err = catalog(&store)
            .enrich_fly(&FlyId::from("fly-1"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn test_search_images_uses_first_matching_fly() {
        let store = Arc::new(MemoryStore::with_names(&["Royal Wulff", "Adams", "Parachute Adams"]));
        let search = Arc::new(StaticSearch::new(&["https://img.test/a.jpg"]));
        let catalog = catalog(&store).with_image_search(search.clone());

        let outcome = catalog.search_images("adams").await.unwrap();
        assert_eq!(outcome.fly.unwrap().name, "Adams");
        assert_eq!(outcome.hits.len(), 1);
        assert!(outcome.message.is_none());
        assert_eq!(search.queries.lock().unwrap()[0], "Adams fly fishing fly");

        let none = catalog.search_images("hopper").await.unwrap();
        assert_eq!(none.message.unwrap().message, "No flies found with that name");
    }

    #[tokio::test]
    async fn test_search_images_without_hits() {
        let store = Arc::new(MemoryStore::with_names(&["Adams"]));
        let catalog = catalog(&store).with_image_search(Arc::new(StaticSearch::new(&[])));
        let outcome = catalog.search_images("Adams").await.unwrap();
        assert_eq!(outcome.message.unwrap().message, "No images found");
    }

    #[tokio::test]
    async fn test_waitlist_requires_email() {
        let store = Arc::new(MemoryStore::default());
        let catalog = catalog(&store);

        let err = catalog.join_waitlist(None, "not-an-email").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::InvalidEmail)));
        assert_eq!(store.call_count(), 0);

        let ok = catalog
            .join_waitlist(Some("  ".into()), " angler@example.com ")
            .await
            .unwrap();
        assert_eq!(ok.message, "Successfully joined the waitlist!");
        let entry = store.waitlist.lock().unwrap()[0].clone();
        assert_eq!(entry, WaitlistEntry { name: None, email: "angler@example.com".into() });
    }

    #[tokio::test]
    async fn test_deletion_request_is_pending() {
        let store = Arc::new(MemoryStore::default());
        catalog(&store)
            .request_data_deletion("angler@example.com")
            .await
            .unwrap();
        assert_eq!(store.deletions.lock().unwrap()[0].status, DeletionStatus::Pending);
    }
}
