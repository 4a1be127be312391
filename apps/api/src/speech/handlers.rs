use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::speech::AudioUpload;
use crate::state::AppState;

const AUDIO_FIELD: &str = "audio";

#[derive(Debug, Serialize)]
pub struct TranscriptionResponse {
    pub text: String,
    pub status: String,
}

/// POST /api/speech-to-text
///
/// Expects a multipart form with an `audio` file field.
pub async fn handle_speech_to_text(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<TranscriptionResponse>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("recording.webm").to_string();
        let content_type = field.content_type().unwrap_or("audio/webm").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read audio: {e}")))?;
        upload = Some(AudioUpload {
            file_name,
            content_type,
            data,
        });
        break;
    }

    let upload = upload
        .ok_or_else(|| AppError::Validation("Missing 'audio' file field".to_string()))?;
    let text = state.speech.transcribe(upload).await?;

    Ok(Json(TranscriptionResponse {
        text,
        status: "success".to_string(),
    }))
}
