use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    errors::AppError,
    models::student::{StudentForm, StudentModel},
    pagination::PageRequest,
    routes::{Notice, dashboard::render_dashboard},
    startup::AppState,
};

#[derive(Template)]
#[template(path = "edit.html")]
struct EditTemplate {
    id: Uuid,
    form: StudentForm,
    notice: Option<Notice>,
}

fn render_edit(id: Uuid, form: StudentForm, status: StatusCode, notice: Option<Notice>) -> Response {
    match (EditTemplate { id, form, notice }).render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => AppError::from(e).into_response(),
    }
}

#[instrument(name = "Web: Add student", skip(state, form))]
pub async fn create_student(
    State(state): State<AppState>,
    Form(form): Form<StudentForm>,
) -> Response {
    match state.student_service.create(&form).await {
        Ok(student) => {
            render_dashboard(
                &state,
                PageRequest::default(),
                StatusCode::OK,
                Some(Notice::success(format!(
                    "✓ Student added successfully! Card link: {}",
                    student.digital_card_link
                ))),
                None,
            )
            .await
        }
        Err(e) => {
            tracing::warn!("Failed to add student: {}", e);
            render_dashboard(
                &state,
                PageRequest::default(),
                e.status(),
                Some(Notice::error(format!("Error adding student: {e}"))),
                Some(form),
            )
            .await
        }
    }
}

#[instrument(name = "Web: Edit student form", skip(state))]
pub async fn edit_page(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.student_service.get(id).await {
        Ok(student) => render_edit(id, StudentForm::from(&student), StatusCode::OK, None),
        Err(e) => {
            tracing::warn!("Failed to load student: {}", e);
            render_dashboard(
                &state,
                PageRequest::default(),
                e.status(),
                Some(Notice::error(e.to_string())),
                None,
            )
            .await
        }
    }
}

#[instrument(name = "Web: Update student", skip(state, form))]
pub async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<StudentForm>,
) -> Response {
    match state.student_service.update(id, &form).await {
        Ok(_) => {
            render_dashboard(
                &state,
                PageRequest::default(),
                StatusCode::OK,
                Some(Notice::success("✓ Student updated successfully!")),
                None,
            )
            .await
        }
        Err(e) => {
            tracing::warn!("Failed to update student: {}", e);
            let status = e.status();
            render_edit(
                id,
                form,
                status,
                Some(Notice::error(format!("Error updating student: {e}"))),
            )
        }
    }
}

#[instrument(name = "Web: Delete student", skip(state))]
pub async fn delete_student(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let (status, notice) = match state.student_service.delete(id).await {
        Ok(StudentModel { full_name, .. }) => (
            StatusCode::OK,
            Notice::success(format!("✓ {full_name} deleted successfully!")),
        ),
        Err(e) => (
            e.status(),
            Notice::error(format!("Error deleting student: {e}")),
        ),
    };
    render_dashboard(&state, PageRequest::default(), status, Some(notice), None).await
}
