use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, State},
    response::IntoResponse,
    routing::post,
};
use crates::{
    domain::repositories::storage::ObjectStorage,
    infra::storages::supabase_storage::SupabaseStorageClient,
};
use tracing::{info, warn};

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppError,
    usecases::uploads::{UploadFile, UploadsUseCase},
};

const FILE_FIELD: &str = "file";

pub fn routes(storage: Arc<SupabaseStorageClient>) -> Router {
    let usecase = UploadsUseCase::new(storage);

    Router::new()
        .route("/", post(upload))
        .with_state(Arc::new(usecase))
}

pub async fn upload<S>(
    State(usecase): State<Arc<UploadsUseCase<S>>>,
    AuthUser { user_id, .. }: AuthUser,
    mut multipart: Multipart,
) -> impl IntoResponse
where
    S: ObjectStorage + Send + Sync + 'static,
{
    info!(%user_id, "uploads: request received");

    let file = loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => {
                return AppError::bad_request("multipart field `file` is required").into_response();
            }
            Err(err) => {
                warn!(%user_id, error = %err, "uploads: malformed multipart body");
                return AppError::bad_request("malformed multipart body").into_response();
            }
        };

        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        match field.bytes().await {
            Ok(bytes) => {
                break UploadFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                };
            }
            Err(err) => {
                warn!(%user_id, error = %err, "uploads: failed to read file field");
                return AppError::new(err.status(), err.body_text()).into_response();
            }
        }
    };

    match usecase.upload(user_id, file).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
