//! Admin console endpoints

use super::events::ServerEvent;
use super::{ApiClient, ApiRequest, ClientError, RequestTimeout};
use crate::session::{Audience, CredentialStore};
use crate::types::{
    CompressionProgress, ImageFile, ListQuery, LoginRequest, LoginResponse, PostPayload,
    RoleUpdate, StatusUpdate, TaxonomyPayload,
};
use futures::{Stream, StreamExt};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::Value;

impl ApiClient {
    pub const fn admin_auth<'a>(&'a self, credentials: &'a CredentialStore) -> AdminAuthApi<'a> {
        AdminAuthApi {
            client: self,
            credentials,
        }
    }

    pub const fn admin_posts(&self) -> AdminPostsApi<'_> {
        AdminPostsApi { client: self }
    }

    pub const fn admin_categories(&self) -> TaxonomyApi<'_> {
        TaxonomyApi {
            client: self,
            list_path: "/categories",
            admin_path: "/admin/categories",
        }
    }

    pub const fn admin_tags(&self) -> TaxonomyApi<'_> {
        TaxonomyApi {
            client: self,
            list_path: "/tags",
            admin_path: "/admin/tags",
        }
    }

    pub const fn admin_comments(&self) -> AdminCommentsApi<'_> {
        AdminCommentsApi { client: self }
    }

    pub const fn admin_users(&self) -> AdminUsersApi<'_> {
        AdminUsersApi { client: self }
    }

    pub const fn admin_pages(&self) -> AdminPagesApi<'_> {
        AdminPagesApi { client: self }
    }

    pub const fn admin_upload(&self) -> AdminUploadApi<'_> {
        AdminUploadApi { client: self }
    }
}

fn image_part(image: &ImageFile) -> Result<Part, ClientError> {
    let part = Part::bytes(image.bytes.clone()).file_name(image.file_name.clone());
    match &image.mime {
        Some(mime) => Ok(part.mime_str(mime)?),
        None => Ok(part),
    }
}

/// Build the multipart body used when a post carries an image.
///
/// Array fields are sent as repeated `category_ids[]` / `tag_ids[]` entries.
pub fn post_form(payload: &PostPayload, image: &ImageFile) -> Result<Form, ClientError> {
    let mut form = Form::new()
        .part("image", image_part(image)?)
        .text("title", payload.title.clone());

    if let Some(excerpt) = payload.excerpt.as_ref().filter(|e| !e.is_empty()) {
        form = form.text("excerpt", excerpt.clone());
    }
    form = form.text("content", payload.content.clone());

    for id in &payload.category_ids {
        form = form.text("category_ids[]", id.to_string());
    }
    for id in &payload.tag_ids {
        form = form.text("tag_ids[]", id.to_string());
    }
    if let Some(status) = payload.status.as_ref().filter(|s| !s.is_empty()) {
        form = form.text("status", status.clone());
    }
    Ok(form)
}

/// Admin sign-in and sign-out
pub struct AdminAuthApi<'a> {
    client: &'a ApiClient,
    credentials: &'a CredentialStore,
}

impl AdminAuthApi<'_> {
    /// Sign in and store the returned admin session
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let response: LoginResponse = self
            .client
            .post("/users/login")
            .json(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .execute()
            .await?;

        self.credentials
            .set_session(Audience::Admin, &response.token, &response.user)?;
        info!(user_id = %response.user.id, role = %response.user.role, "Admin signed in");
        Ok(response)
    }

    /// Forget the admin session locally; the server expires the token itself
    pub fn logout(&self) -> Result<(), ClientError> {
        self.credentials.clear_session(Audience::Admin)?;
        info!("Admin signed out");
        Ok(())
    }
}

/// Post management
pub struct AdminPostsApi<'a> {
    client: &'a ApiClient,
}

impl AdminPostsApi<'_> {
    pub async fn list(&self, query: &ListQuery) -> Result<Value, ClientError> {
        self.client.get("/admin/posts").query(query).execute().await
    }

    pub async fn detail(&self, id: i64) -> Result<Value, ClientError> {
        self.client.get(&format!("/admin/posts/{id}")).execute().await
    }

    /// Create a post; multipart with the upload timeout when an image is given, JSON otherwise
    pub async fn create(
        &self,
        payload: &PostPayload,
        image: Option<&ImageFile>,
    ) -> Result<Value, ClientError> {
        self.with_body(self.client.post("/admin/posts"), payload, image)?
            .execute()
            .await
    }

    /// Update a post; same encoding rules as [`Self::create`]
    pub async fn update(
        &self,
        id: i64,
        payload: &PostPayload,
        image: Option<&ImageFile>,
    ) -> Result<Value, ClientError> {
        self.with_body(self.client.put(&format!("/admin/posts/{id}")), payload, image)?
            .execute()
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<Value, ClientError> {
        self.client.delete(&format!("/admin/posts/{id}")).execute().await
    }

    fn with_body(
        &self,
        request: ApiRequest,
        payload: &PostPayload,
        image: Option<&ImageFile>,
    ) -> Result<ApiRequest, ClientError> {
        Ok(match image {
            Some(image) => request
                .multipart(post_form(payload, image)?)
                .timeout(RequestTimeout::Fixed(self.client.upload_timeout())),
            None => request.json(payload),
        })
    }
}

/// Categories or tags: read through the public path, written through the admin one
pub struct TaxonomyApi<'a> {
    client: &'a ApiClient,
    list_path: &'static str,
    admin_path: &'static str,
}

impl TaxonomyApi<'_> {
    pub async fn list(&self) -> Result<Value, ClientError> {
        self.client.get(self.list_path).execute().await
    }

    pub async fn create(&self, payload: &TaxonomyPayload) -> Result<Value, ClientError> {
        self.client.post(self.admin_path).json(payload).execute().await
    }

    pub async fn update(&self, id: i64, payload: &TaxonomyPayload) -> Result<Value, ClientError> {
        self.client
            .put(&format!("{}/{id}", self.admin_path))
            .json(payload)
            .execute()
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<Value, ClientError> {
        self.client
            .delete(&format!("{}/{id}", self.admin_path))
            .execute()
            .await
    }
}

/// Comment moderation
pub struct AdminCommentsApi<'a> {
    client: &'a ApiClient,
}

impl AdminCommentsApi<'_> {
    pub async fn list(&self, query: &ListQuery) -> Result<Value, ClientError> {
        self.client.get("/admin/comments").query(query).execute().await
    }

    pub async fn delete(&self, id: i64) -> Result<Value, ClientError> {
        self.client
            .delete(&format!("/admin/comments/{id}"))
            .execute()
            .await
    }

    pub async fn update_status(&self, id: i64, status: &str) -> Result<Value, ClientError> {
        self.client
            .put(&format!("/admin/comments/{id}/status"))
            .json(&StatusUpdate {
                status: status.to_string(),
            })
            .execute()
            .await
    }
}

/// User management
pub struct AdminUsersApi<'a> {
    client: &'a ApiClient,
}

impl AdminUsersApi<'_> {
    pub async fn list(&self, query: &ListQuery) -> Result<Value, ClientError> {
        self.client.get("/admin/users").query(query).execute().await
    }

    pub async fn delete(&self, id: i64) -> Result<Value, ClientError> {
        self.client.delete(&format!("/admin/users/{id}")).execute().await
    }

    pub async fn update_status(&self, id: i64, status: &str) -> Result<Value, ClientError> {
        self.client
            .put(&format!("/admin/users/{id}/status"))
            .json(&StatusUpdate {
                status: status.to_string(),
            })
            .execute()
            .await
    }

    pub async fn update_role(&self, id: i64, role: &str) -> Result<Value, ClientError> {
        self.client
            .put(&format!("/admin/users/{id}/role"))
            .json(&RoleUpdate {
                role: role.to_string(),
            })
            .execute()
            .await
    }
}

/// Static pages
pub struct AdminPagesApi<'a> {
    client: &'a ApiClient,
}

impl AdminPagesApi<'_> {
    pub async fn list(&self) -> Result<Value, ClientError> {
        self.client.get("/admin/pages").execute().await
    }

    pub async fn detail(&self, id: i64) -> Result<Value, ClientError> {
        self.client.get(&format!("/admin/pages/{id}")).execute().await
    }

    pub async fn create<P: Serialize + ?Sized>(&self, payload: &P) -> Result<Value, ClientError> {
        self.client.post("/admin/pages").json(payload).execute().await
    }

    pub async fn update<P: Serialize + ?Sized>(
        &self,
        id: i64,
        payload: &P,
    ) -> Result<Value, ClientError> {
        self.client
            .put(&format!("/admin/pages/{id}"))
            .json(payload)
            .execute()
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<Value, ClientError> {
        self.client.delete(&format!("/admin/pages/{id}")).execute().await
    }
}

/// Image uploads and compression jobs
pub struct AdminUploadApi<'a> {
    client: &'a ApiClient,
}

impl AdminUploadApi<'_> {
    /// Upload one image; the response carries its URL
    pub async fn upload_image(&self, image: &ImageFile) -> Result<Value, ClientError> {
        let form = Form::new().part("image", image_part(image)?);
        self.client
            .post("/admin/upload/image")
            .multipart(form)
            .timeout(RequestTimeout::Fixed(self.client.upload_timeout()))
            .execute()
            .await
    }

    /// Follow a compression job until the server closes the stream.
    ///
    /// Neither the returned future nor the stream borrow the client.
    pub fn compression_progress(
        &self,
        job_id: &str,
    ) -> impl Future<
        Output = Result<
            impl Stream<Item = Result<CompressionProgress, ClientError>> + use<>,
            ClientError,
        >,
    > + use<> {
        let request = self
            .client
            .get("/admin/upload/progress")
            .query(&[("job_id", job_id)]);

        async move {
            let events = request.event_stream().await?;
            Ok(events.map(|event| event.and_then(|event: ServerEvent| event.json())))
        }
    }
}
