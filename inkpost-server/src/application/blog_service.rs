use crate::data::post_repository::{NewPost, Pagination, PostPatch, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::post::{CreatePostRequest, Post, UpdatePostRequest};

#[derive(Debug, Clone)]
pub(crate) struct ListPostsResult {
    pub(crate) posts: Vec<Post>,
    pub(crate) page: u32,
    pub(crate) page_size: u32,
    pub(crate) total: i64,
}

pub(crate) struct BlogService<R: PostRepository> {
    repo: R,
}

impl<R: PostRepository> BlogService<R> {
    pub(crate) fn new(repo: R) -> Self {
        Self { repo }
    }

    pub(crate) async fn create_post(
        &self,
        author_id: i64,
        req: CreatePostRequest,
    ) -> Result<Post, DomainError> {
        let req = req.validate()?;

        let new_post = NewPost {
            title: req.title,
            content: req.content,
            author_id,
        };
        self.repo.create_post(new_post).await
    }

    pub(crate) async fn get_post(&self, id: i64) -> Result<Post, DomainError> {
        self.repo
            .get_post(id)
            .await?
            .ok_or(DomainError::NotFound(format!("post id: {id}")))
    }

    /// Missing post wins over ownership: a 404 is returned before the author
    /// check, matching the delete path.
    pub(crate) async fn update_post(
        &self,
        actor_user_id: i64,
        post_id: i64,
        req: UpdatePostRequest,
    ) -> Result<Post, DomainError> {
        let req = req.validate()?;

        let original_post = self
            .repo
            .get_post(post_id)
            .await?
            .ok_or(DomainError::NotFound(format!("post id: {post_id}")))?;

        if original_post.author_id != actor_user_id {
            return Err(DomainError::Forbidden);
        }

        let patch = PostPatch {
            title: req.title,
            content: req.content,
        };
        self.repo
            .update_post(post_id, patch)
            .await?
            .ok_or(DomainError::NotFound(format!("post id: {post_id}")))
    }

    pub(crate) async fn delete_post(
        &self,
        actor_user_id: i64,
        post_id: i64,
    ) -> Result<(), DomainError> {
        let original_post = self
            .repo
            .get_post(post_id)
            .await?
            .ok_or(DomainError::NotFound(format!("post id: {post_id}")))?;

        if original_post.author_id != actor_user_id {
            return Err(DomainError::Forbidden);
        }

        let deleted = self.repo.delete_post(post_id).await?;
        if !deleted {
            return Err(DomainError::NotFound(format!("post id: {post_id}")));
        }
        Ok(())
    }

    pub(crate) async fn list_posts(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<ListPostsResult, DomainError> {
        let pagination = Pagination { page, page_size };
        let posts = self.repo.list_posts(pagination).await?;
        let total = self.repo.total_posts().await?;

        Ok(ListPostsResult {
            posts,
            page,
            page_size,
            total,
        })
    }
}
