use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    errors::AppError,
    models::student::{SchoolId, StudentFields, StudentForm, StudentModel, card_link},
    pagination::{PageRequest, Pagination},
    payload::{self, ScannedStudent},
    store::{CacheRepository, CardLookup, StudentRepository},
};

#[derive(Clone, Debug)]
pub struct StudentService {
    repo: StudentRepository,
    cache: Option<CacheRepository>,
    origin: String,
}

/// One page of the dashboard listing.
#[derive(Debug, Serialize)]
pub struct Listing {
    pub students: Vec<StudentModel>,
    pub pagination: Pagination,
}

impl StudentService {
    pub fn new(repo: StudentRepository, cache: Option<CacheRepository>, origin: &str) -> Self {
        Self {
            repo,
            cache,
            origin: origin.trim_end_matches('/').to_string(),
        }
    }

    pub fn card_link(&self, school_id: &SchoolId) -> String {
        card_link(&self.origin, school_id)
    }

    pub fn parse(&self, raw_text: &str) -> Result<ScannedStudent, AppError> {
        payload::parse(raw_text).map_err(|e| {
            tracing::warn!("Scanned text not recognised");
            AppError::from(e)
        })
    }

    /// Stores a scanned record, replacing any record with the same school ID.
    #[instrument(name = "Service: Save scanned student", skip(self, form), fields(school_id = %form.school_id))]
    pub async fn save_scanned(&self, form: &StudentForm) -> Result<StudentModel, AppError> {
        let fields = form.validate()?;
        let link = self.card_link(&fields.school_id);

        self.mark_stale(&[fields.school_id.as_str()]).await;
        let student = self
            .repo
            .upsert(&fields, &link)
            .await
            .map_err(AppError::storage)?;
        self.mark_stale(&[student.school_id.as_str()]).await;

        tracing::info!(card_link = %student.digital_card_link, "Student saved");
        Ok(student)
    }

    /// Parse then save, for clients that post the raw scan in one step.
    pub async fn scan_and_save(&self, raw_text: &str) -> Result<StudentModel, AppError> {
        let scanned = self.parse(raw_text)?;
        self.save_scanned(&scanned.into()).await
    }

    /// Manual add from the dashboard. Unlike a scan, an existing school ID
    /// is reported rather than overwritten.
    #[instrument(name = "Service: Create student", skip(self, form))]
    pub async fn create(&self, form: &StudentForm) -> Result<StudentModel, AppError> {
        let fields = form.validate()?;
        let link = self.card_link(&fields.school_id);
        self.mark_stale(&[fields.school_id.as_str()]).await;
        let student = self
            .repo
            .insert(&fields, &link)
            .await
            .map_err(AppError::storage)?;
        self.mark_stale(&[student.school_id.as_str()]).await;
        Ok(student)
    }

    #[instrument(name = "Service: List students", skip(self))]
    pub async fn list(&self, request: PageRequest) -> Result<Listing, AppError> {
        let total = self.repo.count().await.map_err(AppError::storage)?;
        let pagination = Pagination::from_request(request, total);
        let students = self
            .repo
            .list(pagination.limit(), pagination.offset())
            .await
            .map_err(AppError::storage)?;
        Ok(Listing {
            students,
            pagination,
        })
    }

    pub async fn get(&self, id: Uuid) -> Result<StudentModel, AppError> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(AppError::storage)?
            .ok_or(AppError::NotFound)
    }

    #[instrument(name = "Service: Update student", skip(self, form))]
    pub async fn update(&self, id: Uuid, form: &StudentForm) -> Result<StudentModel, AppError> {
        let fields: StudentFields = form.validate()?;
        let previous = self.get(id).await?;
        let touched = [previous.school_id.as_str(), fields.school_id.as_str()];

        self.mark_stale(&touched).await;
        let student = self
            .repo
            .update(id, &fields)
            .await
            .map_err(AppError::storage)?
            .ok_or(AppError::NotFound)?;
        self.mark_stale(&touched).await;

        if previous.school_id != student.school_id {
            tracing::warn!(
                old = %previous.school_id,
                new = %student.school_id,
                "School ID changed; stored card link still points at the old ID"
            );
        }
        Ok(student)
    }

    #[instrument(name = "Service: Delete student", skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<StudentModel, AppError> {
        let previous = self.get(id).await?;

        self.mark_stale(&[previous.school_id.as_str()]).await;
        let student = self
            .repo
            .delete(id)
            .await
            .map_err(AppError::storage)?
            .ok_or(AppError::NotFound)?;
        self.mark_stale(&[student.school_id.as_str()]).await;
        Ok(student)
    }

    /// The record behind `/card/{school_id}`.
    #[instrument(name = "Service: Resolve card", skip(self))]
    pub async fn find_card(&self, school_id: &str) -> Result<StudentModel, AppError> {
        let lookup = match &self.cache {
            Some(cache) => cache.lookup(school_id).await,
            None => CardLookup::Bypass,
        };
        let may_backfill = match lookup {
            CardLookup::Hit(student) => return Ok(student),
            CardLookup::Miss => true,
            CardLookup::Bypass => false,
        };

        let student = self
            .repo
            .find_by_school_id(school_id)
            .await
            .map_err(AppError::storage)?
            .ok_or_else(|| {
                tracing::warn!("Card was not found");
                AppError::NotFound
            })?;

        if let (Some(cache), true) = (&self.cache, may_backfill) {
            match cache.backfill(&student).await {
                Ok(true) => {}
                Ok(false) => tracing::debug!("Card changed while loading; not cached"),
                Err(e) => tracing::warn!("Failed to cache card: {:?}", e),
            }
        }
        Ok(student)
    }

    /// Marks cached cards stale around a write. A failed marker is logged
    /// and the cache keeps that key away from readers by itself.
    async fn mark_stale(&self, school_ids: &[&str]) {
        let Some(cache) = &self.cache else {
            return;
        };
        for school_id in school_ids {
            if let Err(e) = cache.mark_stale(school_id).await {
                tracing::error!(school_id = %school_id, "Failed to mark cached card stale: {:?}", e);
            }
        }
    }
}
