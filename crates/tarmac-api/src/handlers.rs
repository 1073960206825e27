//! Request handlers for the write and read surfaces.

use std::io;

use axum::{
    Json,
    body::Body,
    extract::{Form, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use tarmac_core::{ArchiveStatus, LifecycleError, LifecycleManager, NewArchive};
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::{error, warn};

/// Structured API error rendered as a JSON body.
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    title: &'static str,
    detail: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl ApiError {
    const fn new(status: StatusCode, title: &'static str) -> Self {
        Self {
            status,
            title,
            detail: None,
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad request").with_detail(detail)
    }

    const fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "archive not found")
    }

    const fn service_unavailable() -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "archive store unavailable")
    }

    const fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.title,
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::NotFound { .. } => Self::not_found(),
            LifecycleError::Store { .. } => Self::service_unavailable(),
            LifecycleError::TokenGeneration | LifecycleError::RemoveFile { .. } => {
                error!(error = %err, "lifecycle operation failed");
                Self::internal()
            }
        }
    }
}

/// Form body accepted by the checkout-based create endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct CreateArchiveForm {
    #[serde(default)]
    path: String,
    #[serde(default)]
    refid: String,
    #[serde(default)]
    prefix: Option<String>,
}

/// Query parameters accepted by the upload endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct UploadQuery {
    #[serde(default)]
    name: Option<String>,
}

/// Query parameters accepted by the read endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct ReadQuery {
    #[serde(default)]
    keep: Option<String>,
}

/// Response body for a freshly created archive.
#[derive(Serialize)]
pub(crate) struct ArchiveCreated {
    id: String,
    status: &'static str,
}

/// `POST /archives`: create an archive from a source checkout.
pub(crate) async fn create_archive(
    State(manager): State<LifecycleManager>,
    Form(form): Form<CreateArchiveForm>,
) -> Result<impl IntoResponse, ApiError> {
    if form.path.is_empty() {
        return Err(ApiError::bad_request("path is required"));
    }
    if form.refid.is_empty() {
        return Err(ApiError::bad_request("refid is required"));
    }

    let prefix = form.prefix.filter(|prefix| !prefix.is_empty());
    let record = manager
        .create(NewArchive::Checkout {
            workdir: form.path.into(),
            refid: form.refid,
            prefix,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ArchiveCreated {
            id: record.id,
            status: record.status.as_str(),
        }),
    ))
}

/// `PUT /archives`: persist the request body verbatim as a new archive.
pub(crate) async fn upload_archive(
    State(manager): State<LifecycleManager>,
    Query(query): Query<UploadQuery>,
    body: Body,
) -> Result<impl IntoResponse, ApiError> {
    let name = query
        .name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::bad_request("name is required"))?;

    let reader = StreamReader::new(body.into_data_stream().map_err(io::Error::other));
    let record = manager
        .create(NewArchive::Upload {
            name,
            payload: Box::new(reader),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ArchiveCreated {
            id: record.id,
            status: record.status.as_str(),
        }),
    ))
}

/// `GET /archives/{id}`: deliver a ready archive, destroying it afterwards
/// unless the caller passes a truthy `keep`.
pub(crate) async fn read_archive(
    State(manager): State<LifecycleManager>,
    Path(id): Path<String>,
    Query(query): Query<ReadQuery>,
) -> Result<Response, ApiError> {
    let record = manager.get(&id).await?;

    match record.status {
        ArchiveStatus::Building => {
            Ok((StatusCode::ACCEPTED, "archive is still building\n").into_response())
        }
        ArchiveStatus::Destroyed => Err(ApiError::not_found()),
        ArchiveStatus::Error => {
            error!(archive_id = %id, log = %record.log, "serving request hit failed archive");
            Err(ApiError::internal().with_detail(record.log))
        }
        ArchiveStatus::Unknown => {
            error!(archive_id = %id, "archive record carries an unknown status");
            Err(ApiError::internal())
        }
        ArchiveStatus::Ready => {
            // Open before destroying: the unlinked file stays readable
            // through the handle, so the response streams the full payload
            // even though the record is already tombstoned.
            let file = match tokio::fs::File::open(&record.path).await {
                Ok(file) => file,
                Err(err) => {
                    error!(
                        archive_id = %id,
                        path = %record.path.display(),
                        error = %err,
                        "ready archive payload could not be opened"
                    );
                    return Err(ApiError::internal());
                }
            };

            if !keep_requested(query.keep.as_deref()) {
                if let Err(err) = manager.destroy(&id).await {
                    warn!(archive_id = %id, error = %err, "post-read destroy failed");
                }
            }

            let disposition = format!("attachment; filename=\"{id}.tar.gz\"");
            Ok((
                [
                    (header::CONTENT_TYPE, "application/x-gzip".to_owned()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                Body::from_stream(ReaderStream::new(file)),
            )
                .into_response())
        }
    }
}

/// Interpret the `keep` query value; absent or unrecognized means destroy.
fn keep_requested(keep: Option<&str>) -> bool {
    keep.is_some_and(|value| {
        matches!(
            value.to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}
