//! Format listing handler.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use imgshift_convert::FormatId;

use crate::state::AppState;

/// Body of `GET /formats`.
#[derive(Debug, Clone, Serialize)]
pub struct FormatsResponse {
    /// Every accepted source format.
    pub input_formats: Vec<&'static str>,
    /// Reachable targets per source.
    pub output_formats: BTreeMap<&'static str, Vec<&'static str>>,
}

/// GET /formats
pub async fn list_formats(State(state): State<AppState>) -> Json<FormatsResponse> {
    let table = state.service.strategies();

    let output_formats: BTreeMap<_, _> = FormatId::ALL
        .iter()
        .filter_map(|source| {
            let targets: Vec<_> = table
                .supported_targets(*source)
                .iter()
                .map(FormatId::extension)
                .collect();
            (!targets.is_empty()).then(|| (source.extension(), targets))
        })
        .collect();

    let mut input_formats: Vec<_> = output_formats.keys().copied().collect();
    input_formats.sort_unstable();

    Json(FormatsResponse {
        input_formats,
        output_formats,
    })
}
