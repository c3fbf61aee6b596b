use crate::backend::engine::JobEngine;
use bytes::Buf;
use futures_util::TryStreamExt;
use serde::Deserialize;
use serde_json::json;
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::{
    multipart::{FormData, Part},
    Filter,
};

type SharedEngine = Arc<RwLock<JobEngine>>;

#[derive(Debug)]
struct BackendError;

impl warp::reject::Reject for BackendError {}

#[derive(Debug, Deserialize)]
struct ResetRequest {
    task_id: String,
}

/// Hosts the mock inference endpoints over the shared job engine.
pub struct Backend {
    engine: SharedEngine,
}

impl Backend {
    pub fn new(engine: JobEngine, port: u16) -> Self {
        let engine = Arc::new(RwLock::new(engine));
        let engine_for_filter = engine.clone();
        let engine_filter = warp::any().map(move || engine_for_filter.clone());

        let submit_route = warp::path("process_video")
            .and(warp::post())
            .and(warp::multipart::form().max_length(64 * 1024 * 1024))
            .and(engine_filter.clone())
            .and_then(handle_submit);

        let status_route = warp::path!("task_status" / String)
            .and(warp::get())
            .and(engine_filter.clone())
            .map(|id: String, engine: SharedEngine| {
                warp::reply::json(&engine.write().unwrap().poll(&id))
            });

        let side_status_route = warp::path!("get_server_side_status" / String)
            .and(warp::get())
            .and(engine_filter.clone())
            .map(|id: String, engine: SharedEngine| {
                warp::reply::json(&engine.write().unwrap().poll(&id))
            });

        let video_info_route = warp::path!("get_heatmap_video_info" / String)
            .and(warp::get())
            .map(|id: String| {
                warp::reply::json(&json!({
                    "hls_url": format!("/hls_stream/{id}/master.m3u8"),
                    "stream_url": format!("/stream/{id}.mp4"),
                    "mime_type": "video/mp4",
                }))
            });

        let reset_route = warp::path("reset_processing")
            .and(warp::post())
            .and(warp::body::json())
            .and(engine_filter.clone())
            .map(|request: ResetRequest, engine: SharedEngine| {
                engine.write().unwrap().revoke(&request.task_id);
                warp::reply::json(&json!({
                    "message": format!("Task {} has been flagged for cancellation", request.task_id),
                    "state": "REVOKED",
                }))
            });

        let pause_route = warp::path("pause_processing")
            .and(warp::post())
            .map(|| warp::reply::json(&json!({"message": "acknowledged"})));

        let resume_route = warp::path("resume_processing")
            .and(warp::post())
            .map(|| warp::reply::json(&json!({"message": "acknowledged"})));

        let address = SocketAddr::from(([127, 0, 0, 1], port));
        thread::spawn(move || {
            let routes = submit_route
                .or(status_route)
                .or(side_status_route)
                .or(video_info_route)
                .or(reset_route)
                .or(pause_route)
                .or(resume_route);
            let runtime = Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to build runtime");
            runtime.block_on(async move {
                warp::serve(routes).run(address).await;
            });
        });

        Self { engine }
    }

    pub fn publish_status(&self, message: &str) {
        println!("[backend] {}", message);
    }

    #[cfg(test)]
    pub fn engine(&self) -> SharedEngine {
        self.engine.clone()
    }
}

async fn handle_submit(
    form: FormData,
    engine: SharedEngine,
) -> Result<impl warp::Reply, warp::Rejection> {
    let fields = collect_fields(form).await.map_err(|err| {
        eprintln!("process_video error: {}", err);
        warp::reject::custom(BackendError)
    })?;
    let use_heatmap = fields
        .get("use_heatmap")
        .map(|value| value == "true")
        .unwrap_or(false);

    let task_id = engine
        .write()
        .unwrap()
        .submit(use_heatmap)
        .map_err(|err| {
            eprintln!("process_video error: {}", err);
            warp::reject::custom(BackendError)
        })?;

    Ok(warp::reply::json(&json!({
        "task_id": task_id,
        "message": "Processing started in background",
    })))
}

/// Drains the multipart form. The video part is read and discarded; text
/// fields (model, interval, use_heatmap) are collected by name.
async fn collect_fields(mut form: FormData) -> anyhow::Result<HashMap<String, String>> {
    let mut fields = HashMap::new();
    while let Some(part) = form.try_next().await? {
        let name = part.name().to_string();
        let data = read_part(part).await?;
        if name != "video" {
            if let Ok(text) = String::from_utf8(data) {
                fields.insert(name, text);
            }
        }
    }
    Ok(fields)
}

async fn read_part(part: Part) -> anyhow::Result<Vec<u8>> {
    let data = part
        .stream()
        .try_fold(Vec::new(), |mut acc, mut buf| async move {
            while buf.has_remaining() {
                let len = {
                    let chunk = buf.chunk();
                    acc.extend_from_slice(chunk);
                    chunk.len()
                };
                buf.advance(len);
            }
            Ok(acc)
        })
        .await?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::scenario::ScenarioConfig;

    #[test]
    fn backend_shares_one_engine_with_its_routes() {
        let backend = Backend::new(JobEngine::new(ScenarioConfig::default()), 0);
        let id = backend.engine().write().unwrap().submit(false).unwrap();
        let value = backend.engine().write().unwrap().poll(&id);
        assert_eq!(value["state"], "PENDING");
    }
}
