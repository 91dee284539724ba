use crate::{
    errors::AppError,
    models::student::{StudentForm, StudentModel},
    pagination::{PageRequest, Pagination},
    routes::Notice,
    startup::AppState,
};
use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::instrument;

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    students: Vec<StudentModel>,
    pagination: Pagination,
    notice: Option<Notice>,
    add_form: StudentForm,
    show_add_form: bool,
}

#[instrument(name = "Web: Dashboard", skip(state))]
pub async fn dashboard_handler(
    State(state): State<AppState>,
    Query(request): Query<PageRequest>,
) -> Response {
    render_dashboard(&state, request, StatusCode::OK, None, None).await
}

/// Renders the listing with an optional banner. When `add_form` is given the
/// add form is reopened with the operator's input.
pub async fn render_dashboard(
    state: &AppState,
    request: PageRequest,
    status: StatusCode,
    notice: Option<Notice>,
    add_form: Option<StudentForm>,
) -> Response {
    let (students, pagination, notice, status) = match state.student_service.list(request).await {
        Ok(listing) => (listing.students, listing.pagination, notice, status),
        Err(e) => {
            tracing::error!("Failed to list students: {:?}", e);
            (
                Vec::new(),
                Pagination::new(None, request.per_page, 0),
                Some(Notice::error(format!("Error fetching students: {e}"))),
                e.status(),
            )
        }
    };

    let template = DashboardTemplate {
        students,
        pagination,
        notice,
        show_add_form: add_form.is_some(),
        add_form: add_form.unwrap_or_default(),
    };
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => AppError::from(e).into_response(),
    }
}
