use tracing::warn;

use crate::data::user_repository::{ProfilePatch, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::user::{DEFAULT_IMAGE_FILE, UpdateAccountRequest, User};
use crate::infrastructure::media::MediaStore;

/// Raw upload as it came off the wire: the client's filename (for the
/// extension) plus the image bytes.
#[derive(Debug, Clone)]
pub(crate) struct UploadedPicture {
    pub(crate) filename: String,
    pub(crate) data: Vec<u8>,
}

pub(crate) struct AccountService<R: UserRepository> {
    repo: R,
    media: MediaStore,
}

impl<R: UserRepository> AccountService<R> {
    pub(crate) fn new(repo: R, media: MediaStore) -> Self {
        Self { repo, media }
    }

    pub(crate) async fn get_profile(&self, user_id: i64) -> Result<User, DomainError> {
        self.repo
            .get_user(user_id)
            .await?
            .ok_or(DomainError::NotFound(format!("user id: {user_id}")))
    }

    /// Updates username/email, and when a picture is supplied replaces the
    /// stored file. The new file is written and the profile patched before
    /// anything is deleted: a failed patch (conflict, vanished user) leaves
    /// the old file in place and discards the fresh one, so the account
    /// never points at a filename that is gone.
    pub(crate) async fn update_account(
        &self,
        user_id: i64,
        req: UpdateAccountRequest,
        picture: Option<UploadedPicture>,
    ) -> Result<User, DomainError> {
        let req = req.validate()?;

        let current = self
            .repo
            .get_user(user_id)
            .await?
            .ok_or(DomainError::NotFound(format!("user id: {user_id}")))?;

        let new_image = match picture {
            Some(picture) => Some(self.store_picture(picture).await?),
            None => None,
        };

        let patch = ProfilePatch {
            username: req.username,
            email: req.email,
            image_file: new_image.clone(),
        };
        let updated = self.repo.update_profile(user_id, patch).await;

        let user = match updated {
            Ok(Some(user)) => user,
            Ok(None) => {
                if let Some(name) = new_image {
                    self.discard_picture(name).await;
                }
                return Err(DomainError::NotFound(format!("user id: {user_id}")));
            }
            Err(err) => {
                if let Some(name) = new_image {
                    self.discard_picture(name).await;
                }
                return Err(err);
            }
        };

        if new_image.is_some() && current.image_file != DEFAULT_IMAGE_FILE {
            self.discard_picture(current.image_file).await;
        }

        Ok(user)
    }

    async fn store_picture(&self, picture: UploadedPicture) -> Result<String, DomainError> {
        let media = self.media.clone();

        // Decode + resize are CPU-bound, keep them off the async runtime.
        let generated = tokio::task::spawn_blocking(move || {
            media.save_picture(&picture.filename, &picture.data)
        })
        .await
        .map_err(|err| DomainError::Unexpected(err.to_string()))??;

        Ok(generated)
    }

    /// Best-effort removal; the profile no longer references the file, so a
    /// leftover is only disk noise.
    async fn discard_picture(&self, filename: String) {
        let media = self.media.clone();
        let result = tokio::task::spawn_blocking(move || media.remove(&filename)).await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!("failed to remove profile picture: {err}"),
            Err(err) => warn!("picture removal task failed: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use tempfile::tempdir;

    use super::{AccountService, UploadedPicture};
    use crate::data::user_repository::{
        NewUser, ProfilePatch, UserCredentials, UserRepository,
    };
    use crate::domain::error::DomainError;
    use crate::domain::user::{DEFAULT_IMAGE_FILE, UpdateAccountRequest, User};
    use crate::infrastructure::media::MediaStore;

    #[derive(Clone)]
    struct FakeUserRepo {
        current_user: Arc<Mutex<Option<User>>>,
        patch_call: Arc<Mutex<Option<ProfilePatch>>>,
        update_conflict: Arc<Mutex<bool>>,
    }

    impl FakeUserRepo {
        fn new(current_user: Option<User>) -> Self {
            Self {
                current_user: Arc::new(Mutex::new(current_user)),
                patch_call: Arc::new(Mutex::new(None)),
                update_conflict: Arc::new(Mutex::new(false)),
            }
        }

        fn fail_update_with_conflict(&self) {
            *self
                .update_conflict
                .lock()
                .expect("update_conflict mutex poisoned") = true;
        }

        fn take_patch(&self) -> Option<ProfilePatch> {
            self.patch_call
                .lock()
                .expect("patch_call mutex poisoned")
                .take()
        }
    }

    #[async_trait]
    impl UserRepository for FakeUserRepo {
        async fn create_user(&self, _input: NewUser) -> Result<User, DomainError> {
            Err(DomainError::Unexpected("not used".to_string()))
        }

        async fn find_by_email(
            &self,
            _email: &str,
        ) -> Result<Option<UserCredentials>, DomainError> {
            Ok(None)
        }

        async fn get_user(&self, _id: i64) -> Result<Option<User>, DomainError> {
            Ok(self
                .current_user
                .lock()
                .expect("current_user mutex poisoned")
                .clone())
        }

        async fn update_profile(
            &self,
            _id: i64,
            patch: ProfilePatch,
        ) -> Result<Option<User>, DomainError> {
            *self.patch_call.lock().expect("patch_call mutex poisoned") = Some(patch.clone());
            if *self
                .update_conflict
                .lock()
                .expect("update_conflict mutex poisoned")
            {
                return Err(DomainError::AlreadyExists("email".to_string()));
            }
            let current = self
                .current_user
                .lock()
                .expect("current_user mutex poisoned")
                .clone();
            Ok(current.map(|user| {
                User::new(
                    user.id,
                    patch.username,
                    patch.email,
                    patch.image_file.unwrap_or(user.image_file),
                    user.created_at,
                )
                .expect("patched user must be valid")
            }))
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(width, height));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("png must encode");
        buf
    }

    fn sample_user(image_file: &str) -> User {
        User::new(1, "valid_user", "valid@example.com", image_file, Utc::now())
            .expect("sample user must be valid")
    }

    fn update_request() -> UpdateAccountRequest {
        UpdateAccountRequest {
            username: "fresh_name".to_string(),
            email: "fresh@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn update_without_picture_keeps_image_file() {
        let dir = tempdir().expect("tempdir");
        let media = MediaStore::new(dir.path()).expect("store must init");
        let repo = FakeUserRepo::new(Some(sample_user("aabbccdd00112233.png")));
        let service = AccountService::new(repo.clone(), media);

        let user = service
            .update_account(1, update_request(), None)
            .await
            .expect("update must succeed");

        assert_eq!(user.username, "fresh_name");
        assert_eq!(user.image_file, "aabbccdd00112233.png");

        let patch = repo.take_patch().expect("patch must be captured");
        assert!(patch.image_file.is_none());
    }

    #[tokio::test]
    async fn update_with_picture_replaces_old_file() {
        let dir = tempdir().expect("tempdir");
        let media = MediaStore::new(dir.path()).expect("store must init");

        let old_name = "aabbccdd00112233.png";
        std::fs::write(dir.path().join(old_name), b"old bytes").expect("seed old file");

        let repo = FakeUserRepo::new(Some(sample_user(old_name)));
        let service = AccountService::new(repo.clone(), media);

        let picture = UploadedPicture {
            filename: "portrait.png".to_string(),
            data: png_bytes(300, 300),
        };
        let user = service
            .update_account(1, update_request(), Some(picture))
            .await
            .expect("update must succeed");

        assert!(!dir.path().join(old_name).exists(), "old file must be gone");
        assert_ne!(user.image_file, old_name);
        assert!(user.image_file.ends_with(".png"));
        assert!(dir.path().join(&user.image_file).exists());

        let patch = repo.take_patch().expect("patch must be captured");
        assert_eq!(patch.image_file.as_deref(), Some(user.image_file.as_str()));
    }

    #[tokio::test]
    async fn update_with_picture_never_deletes_placeholder() {
        let dir = tempdir().expect("tempdir");
        let media = MediaStore::new(dir.path()).expect("store must init");

        std::fs::write(dir.path().join(DEFAULT_IMAGE_FILE), b"placeholder")
            .expect("seed placeholder");

        let repo = FakeUserRepo::new(Some(sample_user(DEFAULT_IMAGE_FILE)));
        let service = AccountService::new(repo, media);

        let picture = UploadedPicture {
            filename: "portrait.png".to_string(),
            data: png_bytes(50, 50),
        };
        service
            .update_account(1, update_request(), Some(picture))
            .await
            .expect("update must succeed");

        assert!(dir.path().join(DEFAULT_IMAGE_FILE).exists());
    }

    #[tokio::test]
    async fn conflicting_update_keeps_old_picture_and_stores_nothing() {
        let dir = tempdir().expect("tempdir");
        let media = MediaStore::new(dir.path()).expect("store must init");

        let old_name = "aabbccdd00112233.png";
        std::fs::write(dir.path().join(old_name), b"old bytes").expect("seed old file");

        let repo = FakeUserRepo::new(Some(sample_user(old_name)));
        repo.fail_update_with_conflict();
        let service = AccountService::new(repo, media);

        let picture = UploadedPicture {
            filename: "portrait.png".to_string(),
            data: png_bytes(300, 300),
        };
        let err = service
            .update_account(1, update_request(), Some(picture))
            .await
            .expect_err("conflicting update must fail");
        assert!(matches!(err, DomainError::AlreadyExists(_)));

        assert!(
            dir.path().join(old_name).exists(),
            "old file must survive a failed update"
        );
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read media dir")
            .map(|entry| entry.expect("dir entry").file_name())
            .collect();
        assert_eq!(leftovers, vec![old_name], "no fresh file may be left behind");
    }

    #[tokio::test]
    async fn update_with_bad_image_is_a_validation_error() {
        let dir = tempdir().expect("tempdir");
        let media = MediaStore::new(dir.path()).expect("store must init");
        let repo = FakeUserRepo::new(Some(sample_user(DEFAULT_IMAGE_FILE)));
        let service = AccountService::new(repo, media);

        let picture = UploadedPicture {
            filename: "portrait.png".to_string(),
            data: b"not an image".to_vec(),
        };
        let err = service
            .update_account(1, update_request(), Some(picture))
            .await
            .expect_err("garbage upload must fail");
        assert!(matches!(err, DomainError::Validation { field: "picture", .. }));
    }

    #[tokio::test]
    async fn update_for_missing_user_is_not_found() {
        let dir = tempdir().expect("tempdir");
        let media = MediaStore::new(dir.path()).expect("store must init");
        let repo = FakeUserRepo::new(None);
        let service = AccountService::new(repo, media);

        let err = service
            .update_account(1, update_request(), None)
            .await
            .expect_err("missing user must fail");
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
