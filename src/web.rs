//! Single-page web form around the pipeline.

use std::path::Path;
use std::sync::Arc;

use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use eyre::Result;
use log::{debug, error, info, warn};
use serde::Deserialize;

use crate::pipeline::{Pipeline, PipelineError};

#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    pub url: String,
}

pub fn router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/health", get(health))
        .with_state(pipeline)
}

/// Serve the form until the process is stopped
pub async fn serve(pipeline: Arc<Pipeline>, host: &str, port: u16) -> Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}");
    println!("Listening on http://{addr}");

    axum::serve(listener, router(pipeline)).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn index() -> Html<String> {
    debug!("Index page accessed");
    Html(render_page(None))
}

async fn submit(State(pipeline): State<Arc<Pipeline>>, Form(form): Form<SubmitForm>) -> Response {
    debug!("POST request received with URL: {}", form.url);

    match pipeline.run(&form.url).await {
        Ok(report) => {
            let result = (report.artifact.summary_text.as_str(), report.path.as_path());
            Html(render_page(Some(result))).into_response()
        }
        Err(e @ (PipelineError::NoVideoId { .. } | PipelineError::NoTranscript { .. })) => {
            warn!("{e}");
            Html(render_page(None)).into_response()
        }
        Err(e @ PipelineError::Persist(_)) => {
            error!("{e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

fn render_page(result: Option<(&str, &Path)>) -> String {
    let mut page = String::from(
        "<!doctype html>\n\
<title>YouTube Transcript Summarizer</title>\n\
<h1>YouTube Transcript Summarizer</h1>\n\
<form method=post>\n\
  YouTube URL or Video ID: <input type=text name=url>\n\
  <input type=submit value=Submit>\n\
</form>\n",
    );

    if let Some((summary, path)) = result {
        page.push_str(&format!(
            "<h2>Summary:</h2>\n<pre>{}</pre>\n<p>Transcript saved to: {}</p>\n",
            html_escape::encode_text(summary),
            html_escape::encode_text(&path.display().to_string()),
        ));
    }

    page
}
