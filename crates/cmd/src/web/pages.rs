// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Maud rendering of the upload form.
//!
//! The page is a function of the session phase: every notice shown comes
//! from the phase, except `rejected`, which reports an action that was
//! refused without changing it.

use maud::{DOCTYPE, Markup, html};
use volupload::{Failure, Phase, UploadSession, UploadedFile, VALIDATED_MESSAGE};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const VOLUMES_DOCS: &str = "https://docs.databricks.com/en/volumes/index.html";
const PRIVILEGES_DOCS: &str =
    "https://docs.databricks.com/en/volumes/privileges.html#privileges-required-for-volume-operations";

pub const VOLUME_PLACEHOLDER: &str = "main.marketing.raw_files";
pub const TABLE_PLACEHOLDER: &str = "test_table";

/// What to render for one response
pub struct Page<'a> {
    pub session: &'a UploadSession,
    /// Workspace hostname used for explorer links
    pub hostname: &'a str,
    pub rejected: Option<&'a str>,
}

pub fn render(page: &Page) -> String {
    document(
        "Upload a file",
        html! {
            h1 { "Volumes" }
            h2 { "Upload a file" }
            p {
                "This recipe uploads a file to a "
                a href=(VOLUMES_DOCS) { "Unity Catalog Volume" }
                "."
            }
            section class="try-it" {
                @if let Some(message) = page.rejected {
                    (error_notice(message))
                }
                (workflow(page))
            }
            (requirements())
        },
    )
}

/// Bare page for requests that never reached a session
pub fn render_error(message: &str) -> String {
    document(
        "Upload a file",
        html! {
            h1 { "Volumes" }
            (error_notice(message))
            p { a href="/" { "Back to the form" } }
        },
    )
}

fn document(title: &str, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                meta name="generator" content=(format!("volupload v{}", VERSION));
                title { (title) }
            }
            body {
                main { (body) }
            }
        }
    }
    .into_string()
}

fn workflow(page: &Page) -> Markup {
    let session = page.session;
    html! {
        (check_form(session))
        @match session.phase() {
            Phase::Idle | Phase::Checking => {}
            Phase::Denied(failure) => {
                (failure_notice(failure))
            }
            Phase::Validated(_) | Phase::Uploading(_) => {
                (success_notice(VALIDATED_MESSAGE))
            }
            Phase::UploadFailed(_, failure) => {
                (success_notice(VALIDATED_MESSAGE))
                (failure_notice(failure))
            }
            Phase::Uploaded(file) | Phase::Creating(file) => {
                (uploaded_notice(file, page.hostname))
            }
            Phase::CreateFailed(file, failure) => {
                (uploaded_notice(file, page.hostname))
                (failure_notice(failure))
            }
            Phase::Created(file, created) => {
                (uploaded_notice(file, page.hostname))
                div class="notice success" {
                    "Table `" (created.table.table()) "` created successfully!"
                    @if let Some(rows) = created.rows_inserted {
                        " " (rows) " rows inserted."
                    }
                }
            }
        }
        @if session.can_upload() {
            @if let Some(volume) = session.volume() {
                form method="post" action="/upload" enctype="multipart/form-data" {
                    label for="file" { "Pick a file to upload" }
                    input type="file" id="file" name="file" required;
                    button type="submit" { "Upload file to " (volume) }
                }
            }
        }
        @if session.can_create_table() {
            form method="post" action="/table" {
                label for="table_name" { "Specify table name to create from CSV:" }
                input type="text" id="table_name" name="table_name" placeholder=(TABLE_PLACEHOLDER);
                button type="submit" { "Create Table from Uploaded File" }
            }
        }
    }
}

fn check_form(session: &UploadSession) -> Markup {
    html! {
        form method="post" action="/check" {
            label for="volume" { "Specify a Unity Catalog Volume name:" }
            input type="text" id="volume" name="volume"
                placeholder=(VOLUME_PLACEHOLDER) value=(session.volume_input());
            button type="submit" { "Check Volume and permissions" }
        }
    }
}

fn uploaded_notice(file: &UploadedFile, hostname: &str) -> Markup {
    html! {
        div class="notice success" {
            "File '" (file.file_name) "' uploaded to "
            strong { (file.volume) }
            ". "
            a href=(file.volume.explore_url(hostname)) { "Go to volume" }
        }
    }
}

fn success_notice(message: &str) -> Markup {
    html! {
        div class="notice success" { (message) }
    }
}

fn failure_notice(failure: &Failure) -> Markup {
    html! {
        div class=(if failure.partial { "notice error partial" } else { "notice error" }) {
            (failure.message)
        }
    }
}

fn error_notice(message: &str) -> Markup {
    html! {
        div class="notice error" { (message) }
    }
}

fn requirements() -> Markup {
    html! {
        section class="requirements" {
            h3 { "Requirements" }
            div {
                strong { "Permissions (app service principal)" }
                ul {
                    li { code { "USE CATALOG" } " on the catalog of the volume" }
                    li { code { "USE SCHEMA" } " on the schema of the volume" }
                    li { code { "READ VOLUME" } " and " code { "WRITE VOLUME" } " on the volume" }
                }
                p {
                    "See "
                    a href=(PRIVILEGES_DOCS) { "Privileges required for volume operations" }
                    " for more information."
                }
            }
            div {
                strong { "Databricks resources" }
                ul {
                    li { "Unity Catalog volume" }
                    li { "SQL warehouse, for creating tables" }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use volupload::{CreatedTable, TableName, VolumeIdentifier};

    fn render_session(session: &UploadSession) -> String {
        render(&Page {
            session,
            hostname: "example.cloud.databricks.com",
            rejected: None,
        })
    }

    #[test]
    fn test_idle_page_shows_only_check_form() {
        let html = render_session(&UploadSession::new());
        assert!(html.contains(r#"placeholder="main.marketing.raw_files""#));
        assert!(html.contains("Check Volume and permissions"));
        assert!(!html.contains(r#"action="/upload""#));
        assert!(!html.contains(r#"action="/table""#));
        assert!(html.contains("READ VOLUME"));
    }

    #[test]
    fn test_created_page_links_volume_and_reports_rows() {
        let volume = VolumeIdentifier::parse("main.marketing.raw_files").unwrap();
        let file = UploadedFile {
            volume: volume.clone(),
            file_name: "data.csv".into(),
            remote_path: volume.file_path("data.csv"),
            size: 3,
            uploaded_at: Utc::now(),
        };
        let mut session = UploadSession::new();
        session.begin_check("main.marketing.raw_files");
        session.finish_check(Ok(volume.clone())).unwrap();
        session.begin_upload().unwrap();
        session.finish_upload(Ok(file)).unwrap();
        session.begin_create().unwrap();
        session
            .finish_create(Ok(CreatedTable {
                table: TableName::new(&volume, "sales").unwrap(),
                rows_inserted: Some(3),
            }))
            .unwrap();

        let html = render_session(&session);
        assert!(html.contains("File 'data.csv' uploaded to <strong>main.marketing.raw_files</strong>"));
        assert!(html.contains(
            r#"href="https://example.cloud.databricks.com/explore/data/volumes/main/marketing/raw_files""#
        ));
        assert!(html.contains("Table `sales` created successfully! 3 rows inserted."));
        assert!(html.contains(r#"value="main.marketing.raw_files""#));
        assert!(html.contains(r#"placeholder="test_table""#));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let mut session = UploadSession::new();
        session.begin_check("<script>");
        let err = volupload::WorkflowError::InvalidIdentifier {
            input: "<script>".into(),
        };
        session.finish_check(Err(&err)).unwrap();

        let html = render_session(&session);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
