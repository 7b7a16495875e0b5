// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::pages::{self, Page};
use super::sessions::{SESSION_COOKIE, SessionStore};
use bytes::{BufMut, Bytes, BytesMut};
use diagnostics::*;
use futures::TryStreamExt;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use volupload::{ErrorKind, UploadSession, UploadWorkflow, WorkflowError, base_name};
use warp::http::StatusCode;
use warp::multipart::FormData;
use warp::{Filter, Rejection, Reply};

/// Upper bound for the urlencoded check and table forms
const FORM_LIMIT: u64 = 16 * 1024;

/// Everything the handlers share
pub struct AppState {
    workflow: UploadWorkflow,
    sessions: SessionStore,
    hostname: String,
    max_upload_bytes: u64,
}

impl AppState {
    pub fn new(
        workflow: UploadWorkflow,
        sessions: SessionStore,
        hostname: impl Into<String>,
        max_upload_bytes: u64,
    ) -> Self {
        Self {
            workflow,
            sessions,
            hostname: hostname.into(),
            max_upload_bytes,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}

#[derive(Deserialize)]
struct CheckForm {
    #[serde(default)]
    volume: String,
}

#[derive(Deserialize)]
struct TableForm {
    #[serde(default)]
    table_name: String,
}

/// All routes of the form app
pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let max_upload = state.max_upload_bytes;
    let with_state = warp::any().map(move || state.clone());
    let session_id = warp::cookie::optional::<String>(SESSION_COOKIE);

    let index = warp::path::end()
        .and(warp::get())
        .and(with_state.clone())
        .and(session_id.clone())
        .then(show_form);

    let check = warp::path!("check")
        .and(warp::post())
        .and(with_state.clone())
        .and(session_id.clone())
        .and(warp::body::content_length_limit(FORM_LIMIT))
        .and(warp::body::form::<CheckForm>())
        .then(check_volume);

    let upload = warp::path!("upload")
        .and(warp::post())
        .and(with_state.clone())
        .and(session_id.clone())
        .and(warp::body::content_length_limit(max_upload))
        .and(warp::multipart::form().max_length(max_upload))
        .then(upload_file);

    let table = warp::path!("table")
        .and(warp::post())
        .and(with_state)
        .and(session_id)
        .and(warp::body::content_length_limit(FORM_LIMIT))
        .and(warp::body::form::<TableForm>())
        .then(create_table);

    index
        .or(check)
        .unify()
        .or(upload)
        .unify()
        .or(table)
        .unify()
        .recover(handle_rejection)
}

type Html = warp::reply::Response;

async fn show_form(state: Arc<AppState>, cookie: Option<String>) -> Html {
    // Sessions start with the first form post
    let Some((id, session)) = state.sessions.get(cookie.as_deref()) else {
        return respond(&state, None, &UploadSession::new(), None);
    };
    let mut session = session.lock().await;
    session.settle();
    respond(&state, Some(&id), &session, None)
}

async fn check_volume(state: Arc<AppState>, cookie: Option<String>, form: CheckForm) -> Html {
    let (id, session) = state.sessions.get_or_create(cookie.as_deref());
    let mut session = session.lock().await;

    // Both outcomes are recorded in the session phase
    if let Err(err) = state.workflow.check(&mut session, &form.volume).await {
        debug!("Check of {volume} failed: {reason}", volume: form.volume.as_str(), reason: err.to_string());
    }
    respond(&state, Some(&id), &session, None)
}

async fn upload_file(state: Arc<AppState>, cookie: Option<String>, form: FormData) -> Html {
    let (id, session) = state.sessions.get_or_create(cookie.as_deref());
    let mut session = session.lock().await;

    let outcome = match read_file_part(form).await {
        Ok(Some((file_name, contents))) => {
            state.workflow.upload(&mut session, &file_name, contents).await.map(|_| ())
        }
        Ok(None) => Err(WorkflowError::InvalidFileName {
            name: String::new(),
        }),
        Err(err) => {
            warn!("Could not read upload body: {reason}", reason: err.to_string());
            let message = format!("Error uploading file: {err}");
            return respond(&state, Some(&id), &session, Some(&message));
        }
    };
    let rejected = rejection_message(outcome);
    respond(&state, Some(&id), &session, rejected.as_deref())
}

async fn create_table(state: Arc<AppState>, cookie: Option<String>, form: TableForm) -> Html {
    let (id, session) = state.sessions.get_or_create(cookie.as_deref());
    let mut session = session.lock().await;

    let outcome = state
        .workflow
        .create_table(&mut session, &form.table_name)
        .await
        .map(|_| ());
    let rejected = rejection_message(outcome);
    respond(&state, Some(&id), &session, rejected.as_deref())
}

/// Message for failures the session phase does not record
fn rejection_message(outcome: Result<(), WorkflowError>) -> Option<String> {
    match outcome {
        Err(err) if matches!(err.kind(), ErrorKind::Input | ErrorKind::Sequence) => {
            info!("Rejected request: {reason}", reason: err.to_string());
            Some(err.to_string())
        }
        _ => None,
    }
}

/// Name and contents of the `file` part, if the form has one
async fn read_file_part(form: FormData) -> Result<Option<(String, Bytes)>, warp::Error> {
    let mut parts = std::pin::pin!(form);
    while let Some(part) = parts.try_next().await? {
        if part.name() != "file" {
            continue;
        }
        let file_name = part.filename().map(base_name).unwrap_or_default().to_string();
        let contents = part
            .stream()
            .try_fold(BytesMut::new(), |mut buffer, chunk| async move {
                buffer.put(chunk);
                Ok(buffer)
            })
            .await?;
        return Ok(Some((file_name, contents.freeze())));
    }
    Ok(None)
}

fn respond(
    state: &AppState,
    id: Option<&str>,
    session: &UploadSession,
    rejected: Option<&str>,
) -> Html {
    let page = warp::reply::html(pages::render(&Page {
        session,
        hostname: &state.hostname,
        rejected,
    }));
    match id {
        Some(id) => warp::reply::with_header(
            page,
            "set-cookie",
            format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax"),
        )
        .into_response(),
        None => page.into_response(),
    }
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Page not found.")
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            "The request is larger than the upload limit.",
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed.")
    } else {
        (StatusCode::BAD_REQUEST, "The request could not be read.")
    };
    warn!("Request rejected with {status}: {reason}", status: status.as_u16(), reason: format!("{err:?}"));

    Ok(warp::reply::with_status(
        warp::reply::html(pages::render_error(message)),
        status,
    ))
}
