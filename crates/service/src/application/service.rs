use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use models::application::{self, Attachment, AttachmentKind, ApplicationStatus, Attachments, Round, RoundStatus, Rounds};

use crate::application::domain::{CreateApplicationInput, UpdateApplicationInput};
use crate::application::repository::ApplicationRepository;
use crate::errors::ServiceError;
use crate::storage::BlobStore;

/// Application service encapsulating the tracker business rules: input
/// validation, the existence-then-ownership guard, and nested round /
/// attachment edits persisted as one full-row write.
pub struct ApplicationService<R: ApplicationRepository> {
    repo: Arc<R>,
    blobs: Arc<dyn BlobStore>,
}

impl<R: ApplicationRepository> ApplicationService<R> {
    pub fn new(repo: Arc<R>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { repo, blobs }
    }

    /// Load the application and verify the caller owns it. Existence is
    /// checked first, so a missing id is NotFound and a foreign one is
    /// Forbidden.
    async fn load_owned(&self, caller_id: Uuid, app_id: Uuid) -> Result<application::Model, ServiceError> {
        let app = self
            .repo
            .find_by_id(app_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("application"))?;
        if app.owner_id != caller_id {
            return Err(ServiceError::Forbidden);
        }
        Ok(app)
    }

    #[instrument(skip(self, input), fields(caller_id = %caller_id, company = %input.company_name))]
    pub async fn create(&self, caller_id: Uuid, input: CreateApplicationInput) -> Result<application::Model, ServiceError> {
        application::validate_company_name(&input.company_name)?;
        application::validate_role(&input.role)?;

        // A non-empty explicit list replaces the default pipeline verbatim.
        let rounds = match input.rounds {
            Some(list) if !list.is_empty() => Rounds(list.into_iter().map(|r| r.into_round()).collect()),
            _ => Rounds::default_pipeline(),
        };

        let now = Utc::now().into();
        let app = application::Model {
            id: Uuid::new_v4(),
            owner_id: caller_id,
            company_name: input.company_name,
            role: input.role,
            status: input.status.unwrap_or_default(),
            notes: input.notes,
            rounds,
            attachments: Attachments::default(),
            created_at: now,
            updated_at: now,
        };
        let created = self.repo.insert(app).await?;
        info!(app_id = %created.id, "application_created");
        Ok(created)
    }

    pub async fn list(&self, caller_id: Uuid) -> Result<Vec<application::Model>, ServiceError> {
        self.repo.find_by_owner(caller_id).await
    }

    pub async fn get(&self, caller_id: Uuid, app_id: Uuid) -> Result<application::Model, ServiceError> {
        self.load_owned(caller_id, app_id).await
    }

    /// Merge the allow-listed fields into the stored application. The
    /// resulting required fields must stay non-empty.
    #[instrument(skip(self, input), fields(caller_id = %caller_id, app_id = %app_id))]
    pub async fn update(&self, caller_id: Uuid, app_id: Uuid, input: UpdateApplicationInput) -> Result<application::Model, ServiceError> {
        let mut app = self.load_owned(caller_id, app_id).await?;

        if let Some(company_name) = input.company_name {
            app.company_name = company_name;
        }
        if let Some(role) = input.role {
            app.role = role;
        }
        if let Some(status) = input.status {
            app.status = status;
        }
        if let Some(notes) = input.notes {
            app.notes = Some(notes);
        }
        if let Some(rounds) = input.rounds {
            app.rounds = Rounds(rounds.into_iter().map(|r| r.into_round()).collect());
        }
        if let Some(attachments) = input.attachments {
            app.attachments = Attachments(attachments.into_iter().map(|a| a.into_attachment()).collect());
        }

        application::validate_company_name(&app.company_name)?;
        application::validate_role(&app.role)?;

        app.updated_at = Utc::now().into();
        let updated = self.repo.replace(app).await?;
        info!(app_id = %updated.id, "application_updated");
        Ok(updated)
    }

    #[instrument(skip(self), fields(caller_id = %caller_id, app_id = %app_id))]
    pub async fn delete(&self, caller_id: Uuid, app_id: Uuid) -> Result<(), ServiceError> {
        let app = self.load_owned(caller_id, app_id).await?;
        self.repo.delete_by_id(app.id).await?;
        info!(app_id = %app.id, "application_deleted");
        Ok(())
    }

    /// Set the overall status; anything outside the closed set is rejected
    /// before the record is even loaded.
    #[instrument(skip(self), fields(caller_id = %caller_id, app_id = %app_id, status = %status))]
    pub async fn set_status(&self, caller_id: Uuid, app_id: Uuid, status: &str) -> Result<application::Model, ServiceError> {
        let status = ApplicationStatus::parse(status)
            .ok_or_else(|| ServiceError::Validation("invalid status".into()))?;

        let mut app = self.load_owned(caller_id, app_id).await?;
        app.status = status;
        app.updated_at = Utc::now().into();
        self.repo.replace(app).await
    }

    /// Append a Pending round at the end of the stored sequence.
    #[instrument(skip(self), fields(caller_id = %caller_id, app_id = %app_id))]
    pub async fn add_round(&self, caller_id: Uuid, app_id: Uuid, name: &str) -> Result<application::Model, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation("round name is required".into()));
        }

        let mut app = self.load_owned(caller_id, app_id).await?;
        app.rounds.push(Round::new(name));
        app.updated_at = Utc::now().into();
        let updated = self.repo.replace(app).await?;
        info!(app_id = %updated.id, round = %name, "round_added");
        Ok(updated)
    }

    #[instrument(skip(self), fields(caller_id = %caller_id, app_id = %app_id, round_id = %round_id))]
    pub async fn set_round_status(&self, caller_id: Uuid, app_id: Uuid, round_id: Uuid, status: &str) -> Result<application::Model, ServiceError> {
        let status = RoundStatus::parse(status)
            .ok_or_else(|| ServiceError::Validation("invalid round status".into()))?;

        let mut app = self.load_owned(caller_id, app_id).await?;
        let round = app
            .rounds
            .get_mut(round_id)
            .ok_or_else(|| ServiceError::not_found("round"))?;
        round.status = status;
        app.updated_at = Utc::now().into();
        self.repo.replace(app).await
    }

    #[instrument(skip(self), fields(caller_id = %caller_id, app_id = %app_id, round_id = %round_id))]
    pub async fn delete_round(&self, caller_id: Uuid, app_id: Uuid, round_id: Uuid) -> Result<application::Model, ServiceError> {
        let mut app = self.load_owned(caller_id, app_id).await?;
        if !app.rounds.remove(round_id) {
            return Err(ServiceError::not_found("round"));
        }
        app.updated_at = Utc::now().into();
        self.repo.replace(app).await
    }

    /// Store the file and append an attachment record. Earlier attachments
    /// of the same kind stay; the newest one is the current one.
    #[instrument(skip(self, bytes), fields(caller_id = %caller_id, app_id = %app_id, kind = %kind, size = bytes.len()))]
    pub async fn add_attachment(
        &self,
        caller_id: Uuid,
        app_id: Uuid,
        kind: &str,
        original_filename: &str,
        bytes: &[u8],
    ) -> Result<application::Model, ServiceError> {
        let kind = AttachmentKind::parse(kind)
            .ok_or_else(|| ServiceError::Validation("invalid attachment type".into()))?;

        let mut app = self.load_owned(caller_id, app_id).await?;
        let stored = self.blobs.store(original_filename, bytes).await?;
        app.attachments.push(Attachment {
            id: Uuid::new_v4(),
            kind,
            filename: stored.filename,
            url: stored.url,
            uploaded_at: Utc::now().into(),
        });
        app.updated_at = Utc::now().into();
        let updated = self.repo.replace(app).await?;
        info!(app_id = %updated.id, kind = kind.as_str(), "attachment_added");
        Ok(updated)
    }

    /// Remove the attachment record only; the stored blob stays behind.
    #[instrument(skip(self), fields(caller_id = %caller_id, app_id = %app_id, attachment_id = %attachment_id))]
    pub async fn delete_attachment(&self, caller_id: Uuid, app_id: Uuid, attachment_id: Uuid) -> Result<application::Model, ServiceError> {
        let mut app = self.load_owned(caller_id, app_id).await?;
        if !app.attachments.remove(attachment_id) {
            return Err(ServiceError::not_found("attachment"));
        }
        app.updated_at = Utc::now().into();
        self.repo.replace(app).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::domain::RoundInput;
    use crate::application::repository::mock::MockApplicationRepository;
    use crate::storage::blob::mock::MockBlobStore;
    use models::application::DEFAULT_PIPELINE;

    fn svc() -> (ApplicationService<MockApplicationRepository>, Arc<MockBlobStore>) {
        let repo = Arc::new(MockApplicationRepository::default());
        let blobs = Arc::new(MockBlobStore::default());
        (ApplicationService::new(repo, blobs.clone()), blobs)
    }

    fn input(company: &str, role: &str) -> CreateApplicationInput {
        CreateApplicationInput {
            company_name: company.to_string(),
            role: role.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_without_rounds_yields_default_pipeline() {
        let (svc, _) = svc();
        let caller = Uuid::new_v4();
        let app = svc.create(caller, input("Acme", "Engineer")).await.unwrap();

        assert_eq!(app.owner_id, caller);
        assert_eq!(app.status, ApplicationStatus::Applied);
        let names: Vec<&str> = app.rounds.0.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, DEFAULT_PIPELINE.to_vec());
        assert!(app.rounds.0.iter().all(|r| r.status == RoundStatus::Pending));
        assert!(app.attachments.is_empty());
    }

    #[tokio::test]
    async fn create_with_explicit_rounds_uses_them_verbatim() {
        let (svc, _) = svc();
        let mut create = input("Acme", "Engineer");
        create.rounds = Some(vec![
            RoundInput { id: None, name: "Phone".into(), status: Some(RoundStatus::Passed), date: None, notes: None },
            RoundInput { id: None, name: "Onsite".into(), status: None, date: None, notes: None },
        ]);
        let app = svc.create(Uuid::new_v4(), create).await.unwrap();

        let names: Vec<&str> = app.rounds.0.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Phone", "Onsite"]);
        assert_eq!(app.rounds.0[0].status, RoundStatus::Passed);
        assert_eq!(app.rounds.0[1].status, RoundStatus::Pending);
    }

    #[tokio::test]
    async fn create_with_empty_rounds_list_falls_back_to_defaults() {
        let (svc, _) = svc();
        let mut create = input("Acme", "Engineer");
        create.rounds = Some(vec![]);
        let app = svc.create(Uuid::new_v4(), create).await.unwrap();
        assert_eq!(app.rounds.len(), 5);
    }

    #[tokio::test]
    async fn create_requires_company_and_role() {
        let (svc, _) = svc();
        let caller = Uuid::new_v4();
        let err = svc.create(caller, input("  ", "Engineer")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Model(_)));
        let err = svc.create(caller, input("Acme", "")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Model(_)));
        assert!(svc.list(caller).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_is_owner_scoped_and_newest_first() {
        let (svc, _) = svc();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        for company in ["First", "Second", "Third"] {
            svc.create(alice, input(company, "Engineer")).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        svc.create(bob, input("Other", "Analyst")).await.unwrap();

        let listed = svc.list(alice).await.unwrap();
        let names: Vec<&str> = listed.iter().map(|a| a.company_name.as_str()).collect();
        assert_eq!(names, vec!["Third", "Second", "First"]);
    }

    #[tokio::test]
    async fn get_distinguishes_missing_from_foreign() {
        let (svc, _) = svc();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let app = svc.create(owner, input("Acme", "Engineer")).await.unwrap();

        let err = svc.get(owner, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = svc.get(stranger, app.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden));
    }

    #[tokio::test]
    async fn foreign_callers_never_mutate_the_record() {
        let (svc, _) = svc();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let app = svc.create(owner, input("Acme", "Engineer")).await.unwrap();
        let round_id = app.rounds.0[0].id;

        assert!(matches!(svc.update(stranger, app.id, UpdateApplicationInput { company_name: Some("Evil".into()), ..Default::default() }).await.unwrap_err(), ServiceError::Forbidden));
        assert!(matches!(svc.set_status(stranger, app.id, "Offered").await.unwrap_err(), ServiceError::Forbidden));
        assert!(matches!(svc.add_round(stranger, app.id, "Extra").await.unwrap_err(), ServiceError::Forbidden));
        assert!(matches!(svc.set_round_status(stranger, app.id, round_id, "Passed").await.unwrap_err(), ServiceError::Forbidden));
        assert!(matches!(svc.delete_round(stranger, app.id, round_id).await.unwrap_err(), ServiceError::Forbidden));
        assert!(matches!(svc.add_attachment(stranger, app.id, "resume", "cv.pdf", b"x").await.unwrap_err(), ServiceError::Forbidden));
        assert!(matches!(svc.delete(stranger, app.id).await.unwrap_err(), ServiceError::Forbidden));

        let unchanged = svc.get(owner, app.id).await.unwrap();
        assert_eq!(unchanged, app);
    }

    #[tokio::test]
    async fn update_merges_allow_listed_fields_only() {
        let (svc, _) = svc();
        let owner = Uuid::new_v4();
        let app = svc.create(owner, input("Acme", "Engineer")).await.unwrap();

        let updated = svc
            .update(owner, app.id, UpdateApplicationInput {
                role: Some("Staff Engineer".into()),
                status: Some(ApplicationStatus::InProcess),
                notes: Some("referred by J".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.company_name, "Acme");
        assert_eq!(updated.role, "Staff Engineer");
        assert_eq!(updated.status, ApplicationStatus::InProcess);
        assert_eq!(updated.notes.as_deref(), Some("referred by J"));
        // identity fields are untouchable
        assert_eq!(updated.id, app.id);
        assert_eq!(updated.owner_id, owner);
        assert_eq!(updated.created_at, app.created_at);
        // rounds left alone when not supplied
        assert_eq!(updated.rounds, app.rounds);
    }

    #[tokio::test]
    async fn update_rejects_emptied_required_fields() {
        let (svc, _) = svc();
        let owner = Uuid::new_v4();
        let app = svc.create(owner, input("Acme", "Engineer")).await.unwrap();

        let err = svc
            .update(owner, app.id, UpdateApplicationInput { company_name: Some("   ".into()), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Model(_)));
        assert_eq!(svc.get(owner, app.id).await.unwrap().company_name, "Acme");
    }

    #[tokio::test]
    async fn update_replaces_rounds_wholesale() {
        let (svc, _) = svc();
        let owner = Uuid::new_v4();
        let app = svc.create(owner, input("Acme", "Engineer")).await.unwrap();

        let updated = svc
            .update(owner, app.id, UpdateApplicationInput {
                rounds: Some(vec![RoundInput { id: None, name: "Final".into(), status: None, date: None, notes: None }]),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.rounds.len(), 1);
        assert_eq!(updated.rounds.0[0].name, "Final");
    }

    #[tokio::test]
    async fn delete_removes_application_and_children() {
        let (svc, _) = svc();
        let owner = Uuid::new_v4();
        let app = svc.create(owner, input("Acme", "Engineer")).await.unwrap();
        let round_id = app.rounds.0[0].id;

        svc.delete(owner, app.id).await.unwrap();

        assert!(matches!(svc.get(owner, app.id).await.unwrap_err(), ServiceError::NotFound(_)));
        // children die with the parent; addressing them now is NotFound on the application
        assert!(matches!(svc.set_round_status(owner, app.id, round_id, "Passed").await.unwrap_err(), ServiceError::NotFound(_)));
        assert!(matches!(svc.delete(owner, app.id).await.unwrap_err(), ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn set_status_enforces_closed_enum() {
        let (svc, _) = svc();
        let owner = Uuid::new_v4();
        let app = svc.create(owner, input("Acme", "Engineer")).await.unwrap();

        let err = svc.set_status(owner, app.id, "Ghosted").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(svc.get(owner, app.id).await.unwrap().status, ApplicationStatus::Applied);

        let updated = svc.set_status(owner, app.id, "Offered").await.unwrap();
        assert_eq!(updated.status, ApplicationStatus::Offered);
    }

    #[tokio::test]
    async fn add_round_trims_name_and_rejects_blank() {
        let (svc, _) = svc();
        let owner = Uuid::new_v4();
        let app = svc.create(owner, input("Acme", "Engineer")).await.unwrap();

        let err = svc.add_round(owner, app.id, "   ").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(svc.get(owner, app.id).await.unwrap().rounds.len(), 5);

        let updated = svc.add_round(owner, app.id, "  System Design  ").await.unwrap();
        assert_eq!(updated.rounds.len(), 6);
        let last = updated.rounds.0.last().unwrap();
        assert_eq!(last.name, "System Design");
        assert_eq!(last.status, RoundStatus::Pending);
    }

    #[tokio::test]
    async fn set_round_status_validates_value_and_round_id() {
        let (svc, _) = svc();
        let owner = Uuid::new_v4();
        let app = svc.create(owner, input("Acme", "Engineer")).await.unwrap();
        let round_id = app.rounds.0[2].id;

        let err = svc.set_round_status(owner, app.id, round_id, "Maybe").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(svc.get(owner, app.id).await.unwrap().rounds.get(round_id).unwrap().status, RoundStatus::Pending);

        let err = svc.set_round_status(owner, app.id, Uuid::new_v4(), "Passed").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let updated = svc.set_round_status(owner, app.id, round_id, "Failed").await.unwrap();
        assert_eq!(updated.rounds.get(round_id).unwrap().status, RoundStatus::Failed);
    }

    #[tokio::test]
    async fn delete_round_missing_id_leaves_rounds_unchanged() {
        let (svc, _) = svc();
        let owner = Uuid::new_v4();
        let app = svc.create(owner, input("Acme", "Engineer")).await.unwrap();

        let err = svc.delete_round(owner, app.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(svc.get(owner, app.id).await.unwrap().rounds, app.rounds);

        let victim = app.rounds.0[1].id;
        let updated = svc.delete_round(owner, app.id, victim).await.unwrap();
        assert_eq!(updated.rounds.len(), 4);
        assert!(updated.rounds.get(victim).is_none());
    }

    #[tokio::test]
    async fn attachments_accumulate_and_validate_kind() {
        let (svc, blobs) = svc();
        let owner = Uuid::new_v4();
        let app = svc.create(owner, input("Acme", "Engineer")).await.unwrap();

        let err = svc.add_attachment(owner, app.id, "cover_letter", "letter.pdf", b"x").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(blobs.stored.lock().unwrap().is_empty());

        let first = svc.add_attachment(owner, app.id, "resume", "cv-v1.pdf", b"one").await.unwrap();
        assert_eq!(first.attachments.len(), 1);
        let second = svc.add_attachment(owner, app.id, "resume", "cv-v2.pdf", b"two").await.unwrap();
        assert_eq!(second.attachments.len(), 2);
        assert!(second.attachments.0.iter().all(|a| a.kind == AttachmentKind::Resume));
        assert_eq!(blobs.stored.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_attachment_removes_only_that_record() {
        let (svc, _) = svc();
        let owner = Uuid::new_v4();
        let app = svc.create(owner, input("Acme", "Engineer")).await.unwrap();
        let app = svc.add_attachment(owner, app.id, "resume", "cv.pdf", b"cv").await.unwrap();
        let app = svc.add_attachment(owner, app.id, "jd", "jd.pdf", b"jd").await.unwrap();
        let resume_id = app.attachments.0[0].id;

        let err = svc.delete_attachment(owner, app.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let updated = svc.delete_attachment(owner, app.id, resume_id).await.unwrap();
        assert_eq!(updated.attachments.len(), 1);
        assert_eq!(updated.attachments.0[0].kind, AttachmentKind::Jd);
    }

    /// End-to-end: add a custom round, pass it, attach and detach a resume.
    #[tokio::test]
    async fn round_and_attachment_lifecycle() {
        let (svc, _) = svc();
        let owner = Uuid::new_v4();
        let app = svc.create(owner, input("Acme", "Engineer")).await.unwrap();
        let original_count = app.rounds.len();

        let app = svc.add_round(owner, app.id, "System Design").await.unwrap();
        let round_id = app.rounds.0.last().unwrap().id;
        let app = svc.set_round_status(owner, app.id, round_id, "Passed").await.unwrap();
        assert_eq!(app.rounds.len(), original_count + 1);
        assert_eq!(app.rounds.get(round_id).unwrap().status, RoundStatus::Passed);

        let app = svc.add_attachment(owner, app.id, "resume", "resume.pdf", b"pdf bytes").await.unwrap();
        let attachment = &app.attachments.0[0];
        assert_eq!(attachment.kind, AttachmentKind::Resume);
        assert!(!attachment.url.is_empty());

        let attachment_id = attachment.id;
        let app = svc.delete_attachment(owner, app.id, attachment_id).await.unwrap();
        assert!(app.attachments.is_empty());
        assert!(svc.get(owner, app.id).await.unwrap().attachments.is_empty());
    }
}
