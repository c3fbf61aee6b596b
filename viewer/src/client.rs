use overlaycore::backend_interface::{RawStatusResponse, VideoInfo};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;

pub const BACKEND_URL: &str = "http://127.0.0.1:9000";

#[derive(Debug, Clone, Deserialize)]
struct SubmitReply {
    task_id: String,
}

/// Uploads a video and starts processing; returns the backend task id.
pub async fn submit_job(
    video_path: String,
    model: String,
    interval: u32,
    use_heatmap: bool,
) -> Result<String, String> {
    let bytes = tokio::fs::read(&video_path)
        .await
        .map_err(|e| format!("reading {video_path}: {e}"))?;
    let file_name = Path::new(&video_path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.mp4".into());

    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name)
        .mime_str("video/mp4")
        .map_err(|e| e.to_string())?;
    let form = reqwest::multipart::Form::new()
        .part("video", part)
        .text("model", model)
        .text("interval", interval.to_string())
        .text("use_heatmap", use_heatmap.to_string());

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{BACKEND_URL}/process_video"))
        .multipart(form)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("submit rejected: {}", response.status()));
    }
    response
        .json::<SubmitReply>()
        .await
        .map(|reply| reply.task_id)
        .map_err(|e| e.to_string())
}

/// One status poll. The response stays raw here; decoding into the
/// status union happens in the update loop so decode errors surface
/// next to the job they belong to.
pub async fn fetch_status(job_id: String) -> Result<RawStatusResponse, String> {
    let response = reqwest::get(format!("{BACKEND_URL}/task_status/{job_id}"))
        .await
        .map_err(|e| e.to_string())?;
    response
        .json::<RawStatusResponse>()
        .await
        .map_err(|e| e.to_string())
}

pub async fn fetch_video_info(job_id: String) -> Result<VideoInfo, String> {
    let response = reqwest::get(format!("{BACKEND_URL}/get_heatmap_video_info/{job_id}"))
        .await
        .map_err(|e| e.to_string())?;
    response
        .json::<VideoInfo>()
        .await
        .map_err(|e| e.to_string())
}

/// Requests cancellation. Local state is not touched; the poller moves to
/// Cancelled when a later status response reports it.
pub async fn cancel_job(job_id: String) -> Result<(), String> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{BACKEND_URL}/reset_processing"))
        .json(&json!({ "task_id": job_id }))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("cancel rejected: {}", response.status()))
    }
}

pub async fn pause_processing() -> Result<(), String> {
    fire_and_forget("pause_processing").await
}

pub async fn resume_processing() -> Result<(), String> {
    fire_and_forget("resume_processing").await
}

async fn fire_and_forget(endpoint: &str) -> Result<(), String> {
    let client = reqwest::Client::new();
    client
        .post(format!("{BACKEND_URL}/{endpoint}"))
        .send()
        .await
        .map(|_| ())
        .map_err(|e| e.to_string())
}
