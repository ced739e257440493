use async_trait::async_trait;
use std::sync::Arc;

use crate::github::{GitHubError, PullRequest};
use crate::traits::{CommentStore, MergeQueue};

/// Acknowledges a queued PR by commenting on it
pub struct CommentingMergeQueue {
    comments: Arc<dyn CommentStore>,
    message: String,
}

impl CommentingMergeQueue {
    pub fn new(comments: Arc<dyn CommentStore>, message: impl Into<String>) -> Self {
        Self {
            comments,
            message: message.into(),
        }
    }
}

#[async_trait]
impl MergeQueue for CommentingMergeQueue {
    async fn enqueue_acknowledgement(&self, pr: &PullRequest) -> Result<(), GitHubError> {
        self.comments.create(&pr.repo, pr.number, &self.message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::RepoRef;
    use crate::traits::MockCommentStore;
    use mockall::predicate::*;

    #[tokio::test]
    async fn test_acknowledgement_is_posted_on_the_pr() {
        let mut comments = MockCommentStore::new();
        comments
            .expect_create()
            .with(eq(RepoRef::new("pingcap", "tidb")), eq(77u64), eq("queued"))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let queue = CommentingMergeQueue::new(Arc::new(comments), "queued");
        let pr = PullRequest {
            repo: RepoRef::new("pingcap", "tidb"),
            number: 77,
            title: "t".to_string(),
            base: "master".to_string(),
            labels: Vec::new(),
            merged_at: None,
            author: "alice".to_string(),
        };
        queue.enqueue_acknowledgement(&pr).await.unwrap();
    }
}
