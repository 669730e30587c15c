use axum::Json;
use siteops_core::status::Vocabularies;

use crate::response::DataResponse;

/// GET /api/v1/vocabulary
///
/// Every closed vocabulary with display labels, for dropdowns and badges.
pub async fn list() -> Json<DataResponse<Vocabularies>> {
    Json(DataResponse {
        data: Vocabularies::all(),
    })
}
