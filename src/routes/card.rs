use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::instrument;

use crate::{card, errors::AppError, models::student::StudentModel, startup::AppState};

#[derive(Template)]
#[template(path = "card.html")]
struct CardTemplate {
    student: StudentModel,
    qr_svg: String,
}

#[derive(Template)]
#[template(path = "card_not_found.html")]
struct CardNotFoundTemplate {
    message: String,
}

/// Public card page. The QR code encodes the stored card link, so scanning a
/// printed card leads back here.
#[instrument(name = "Web: Card view", skip(state))]
pub async fn card_page(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Response, AppError> {
    let student = match state.student_service.find_card(&school_id).await {
        Ok(student) => student,
        Err(AppError::NotFound) => {
            let page = CardNotFoundTemplate {
                message: "This digital membership card does not exist.".into(),
            };
            return Ok((StatusCode::NOT_FOUND, Html(page.render()?)).into_response());
        }
        Err(e) => {
            tracing::error!("Failed to load card: {:?}", e);
            let page = CardNotFoundTemplate {
                message: e.to_string(),
            };
            return Ok((e.status(), Html(page.render()?)).into_response());
        }
    };

    let qr_svg = card::qr_svg(&student.digital_card_link).map_err(|e| {
        tracing::error!("QR encoding failed: {:?}", e);
        AppError::Internal(e.to_string())
    })?;

    Ok(Html(CardTemplate { student, qr_svg }.render()?).into_response())
}
