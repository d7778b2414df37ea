//! Public blog endpoints

use super::{ApiClient, ClientError};
use crate::types::{LikeToggle, ListQuery};
use serde::Serialize;
use serde_json::Value;

impl ApiClient {
    pub const fn posts(&self) -> PostsApi<'_> {
        PostsApi { client: self }
    }

    pub const fn comments(&self) -> CommentsApi<'_> {
        CommentsApi { client: self }
    }

    pub const fn meta(&self) -> MetaApi<'_> {
        MetaApi { client: self }
    }

    pub const fn likes(&self) -> LikesApi<'_> {
        LikesApi { client: self }
    }

    /// Trending data for the home page
    pub async fn hot(&self) -> Result<Value, ClientError> {
        self.get("/hotdata").execute().await
    }
}

/// Published posts
pub struct PostsApi<'a> {
    client: &'a ApiClient,
}

impl PostsApi<'_> {
    pub async fn list(&self, query: &ListQuery) -> Result<Value, ClientError> {
        self.client.get("/posts").query(query).execute().await
    }

    pub async fn detail(&self, id: i64) -> Result<Value, ClientError> {
        self.client.get(&format!("/posts/{id}")).execute().await
    }
}

/// Reader comments
pub struct CommentsApi<'a> {
    client: &'a ApiClient,
}

impl CommentsApi<'_> {
    pub async fn list_by_post(&self, post_id: i64) -> Result<Value, ClientError> {
        self.client
            .get("/comments")
            .query(&[("post_id", post_id)])
            .execute()
            .await
    }

    pub async fn create<P: Serialize + ?Sized>(&self, payload: &P) -> Result<Value, ClientError> {
        self.client.post("/comments").json(payload).execute().await
    }
}

/// Categories and tags
pub struct MetaApi<'a> {
    client: &'a ApiClient,
}

impl MetaApi<'_> {
    pub async fn categories(&self) -> Result<Value, ClientError> {
        self.client.get("/categories").execute().await
    }

    pub async fn tags(&self) -> Result<Value, ClientError> {
        self.client.get("/tags").execute().await
    }
}

/// Post likes
pub struct LikesApi<'a> {
    client: &'a ApiClient,
}

impl LikesApi<'_> {
    pub async fn toggle_for_post(&self, user_id: i64, post_id: i64) -> Result<Value, ClientError> {
        self.client
            .post("/like/toggle")
            .json(&LikeToggle { user_id, post_id })
            .execute()
            .await
    }

    pub async fn count_for_post(&self, post_id: i64) -> Result<Value, ClientError> {
        self.client
            .get("/like/count")
            .query(&[("post_id", post_id)])
            .execute()
            .await
    }
}
