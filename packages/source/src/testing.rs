//! In-memory [`Transport`] for layer and monitor tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Url;

use crate::{HttpResponse, SourceError, Transport};

type Scripted = Result<HttpResponse, String>;

/// Answers requests from a list of `(url fragment, response)` routes.
///
/// The most recently added matching route wins. Unmatched URLs get a 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<(String, Scripted)>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, fragment: &str, response: HttpResponse) {
        self.routes
            .lock()
            .unwrap()
            .push((fragment.to_string(), Ok(response)));
    }

    pub fn respond_json(&self, fragment: &str, body: &serde_json::Value) {
        self.respond(
            fragment,
            HttpResponse::ok(Some("application/json"), body.to_string()),
        );
    }

    pub fn fail(&self, fragment: &str, message: &str) {
        self.routes
            .lock()
            .unwrap()
            .push((fragment.to_string(), Err(message.to_string())));
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, SourceError> {
        let url = url.to_string();
        self.requests.lock().unwrap().push(url.clone());

        let routes = self.routes.lock().unwrap();
        let scripted = routes
            .iter()
            .rev()
            .find(|(fragment, _)| url.contains(fragment.as_str()))
            .map(|(_, scripted)| scripted.clone());
        drop(routes);

        match scripted {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(SourceError::Transport { message }),
            None => Ok(HttpResponse {
                status: 404,
                content_type: None,
                body: Vec::new(),
            }),
        }
    }
}

/// A `FeatureCollection` with one point per `(id, x, y, name)`.
pub fn points(points: &[(&str, f64, f64, &str)]) -> serde_json::Value {
    let features: Vec<serde_json::Value> = points
        .iter()
        .map(|(id, x, y, name)| {
            serde_json::json!({
                "type": "Feature",
                "id": id,
                "geometry": {"type": "Point", "coordinates": [x, y]},
                "properties": {"name": name},
            })
        })
        .collect();
    serde_json::json!({"type": "FeatureCollection", "features": features})
}
