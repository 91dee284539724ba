use askama::Template;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    errors::AppError, models::student::StudentForm, routes::Notice, startup::AppState,
};

#[derive(Template)]
#[template(path = "scan.html")]
struct ScanTemplate {
    raw_text: String,
    notice: Option<Notice>,
}

/// Extracted fields awaiting the operator's confirmation. They travel in
/// hidden inputs; nothing is kept server-side until the save.
#[derive(Template)]
#[template(path = "review.html")]
struct ReviewTemplate {
    form: StudentForm,
    notice: Option<Notice>,
}

#[derive(Debug, Deserialize)]
pub struct ScanForm {
    pub raw_text: String,
}

fn render<T: Template>(template: T, status: StatusCode) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => AppError::from(e).into_response(),
    }
}

pub async fn scan_page() -> Response {
    render(
        ScanTemplate {
            raw_text: String::new(),
            notice: Some(Notice::info(
                "Scan a student ID, or type the text printed under its QR code.",
            )),
        },
        StatusCode::OK,
    )
}

#[instrument(name = "Web: Scan submitted", skip(state, form))]
pub async fn scan_post(State(state): State<AppState>, Form(form): Form<ScanForm>) -> Response {
    match state.student_service.parse(&form.raw_text) {
        Ok(scanned) => render(
            ReviewTemplate {
                form: scanned.into(),
                notice: Some(Notice::success(
                    "QR code scanned successfully! Review data below.",
                )),
            },
            StatusCode::OK,
        ),
        Err(e) => {
            let status = e.status();
            render(
                ScanTemplate {
                    raw_text: form.raw_text,
                    notice: Some(Notice::error(e.to_string())),
                },
                status,
            )
        }
    }
}

#[instrument(name = "Web: Save scanned student", skip(state, form))]
pub async fn save_post(State(state): State<AppState>, Form(form): Form<StudentForm>) -> Response {
    match state.student_service.save_scanned(&form).await {
        Ok(student) => render(
            ScanTemplate {
                raw_text: String::new(),
                notice: Some(Notice::success(format!(
                    "✓ Student saved successfully! Card link: {}",
                    student.digital_card_link
                ))),
            },
            StatusCode::OK,
        ),
        Err(e) => {
            let status = e.status();
            render(
                ReviewTemplate {
                    form,
                    notice: Some(Notice::error(format!("Error saving student: {e}"))),
                },
                status,
            )
        }
    }
}
