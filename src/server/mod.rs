//! Chunkscope HTTP service
//!
//! Holds one dependency graph and exposes:
//! - JSON endpoints to read, replace and edit the graph
//! - Bundle and layout computation over the current graph
//! - A WebSocket that pushes fresh bundle results after every change
//!
//! Every graph change bumps a revision number. Bundle results carry the
//! revision they were computed from so clients can discard stale ones.

mod live;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use colored::Colorize;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::bundler::{annotate_modules, bundle_graph, BundleResult, ModuleAnnotation};
use crate::config::Config;
use crate::graph::{presets, DependencyGraph, Position};
use crate::layout::layout_graph;
use crate::watcher::watch_file;

pub use live::LiveMessage;

/// Options for `chunkscope serve`
#[derive(Debug, Clone)]
pub struct ServeOptions {
    pub host: String,
    pub port: u16,
    pub live: bool,
    /// Graph file to load and watch
    pub graph_path: Option<PathBuf>,
}

/// The graph together with its revision
#[derive(Debug, Clone, Serialize)]
pub struct GraphSnapshot {
    pub revision: u64,
    pub graph: DependencyGraph,
}

/// Bundle result for one revision
#[derive(Debug, Clone, Serialize)]
pub struct BundleSnapshot {
    pub revision: u64,
    pub result: BundleResult,
    pub annotations: Vec<ModuleAnnotation>,
}

type ApiError = (StatusCode, String);

/// Body of `POST /api/modules`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewModule {
    pub name: Option<String>,
    pub position: Position,
}

/// Body of `PATCH /api/modules/:id`
#[derive(Debug, Deserialize)]
pub struct RenameModule {
    pub name: String,
}

/// Body of `POST /api/edges`
#[derive(Debug, Deserialize)]
pub struct NewEdge {
    pub source: String,
    pub target: String,
}

/// Shared server state
pub struct ServerState {
    /// Project configuration
    config: Arc<Config>,

    /// Current graph
    current: RwLock<GraphSnapshot>,

    /// Live update broadcast channel
    live_tx: broadcast::Sender<LiveMessage>,
}

impl ServerState {
    pub fn new(config: Arc<Config>, graph: DependencyGraph) -> Arc<Self> {
        let (live_tx, _) = broadcast::channel::<LiveMessage>(100);

        Arc::new(Self {
            config,
            current: RwLock::new(GraphSnapshot { revision: 0, graph }),
            live_tx,
        })
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        self.current.read().clone()
    }

    pub fn revision(&self) -> u64 {
        self.current.read().revision
    }

    /// Subscribe to live updates
    pub fn subscribe(&self) -> broadcast::Receiver<LiveMessage> {
        self.live_tx.subscribe()
    }

    /// Run `edit` on the graph. If it reports a change, bump the revision and
    /// publish the new bundle result.
    pub fn update<F>(&self, edit: F) -> Option<GraphSnapshot>
    where
        F: FnOnce(&mut DependencyGraph) -> bool,
    {
        let snapshot = {
            let mut current = self.current.write();
            if !edit(&mut current.graph) {
                return None;
            }
            current.revision += 1;
            current.clone()
        };

        debug!("Graph changed, now at revision {}", snapshot.revision);
        self.publish(&snapshot);
        Some(snapshot)
    }

    /// Replace the whole graph
    pub fn replace(&self, graph: DependencyGraph) -> GraphSnapshot {
        let snapshot = {
            let mut current = self.current.write();
            current.graph = graph;
            current.revision += 1;
            current.clone()
        };

        self.publish(&snapshot);
        snapshot
    }

    /// Bundle the current graph
    pub fn bundle(&self) -> BundleSnapshot {
        bundle_snapshot(&self.snapshot())
    }

    /// Report a problem to live clients
    pub fn report_error(&self, message: String) {
        let _ = self.live_tx.send(LiveMessage::Error { message });
    }

    fn publish(&self, snapshot: &GraphSnapshot) {
        let result = bundle_graph(&snapshot.graph);
        // No receivers is fine
        let _ = self.live_tx.send(LiveMessage::BundleUpdated {
            revision: snapshot.revision,
            result,
        });
    }
}

fn bundle_snapshot(snapshot: &GraphSnapshot) -> BundleSnapshot {
    let result = bundle_graph(&snapshot.graph);
    let annotations = annotate_modules(&snapshot.graph.modules, &result);

    BundleSnapshot {
        revision: snapshot.revision,
        result,
        annotations,
    }
}

/// Build the API router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/api/graph", get(get_graph).put(put_graph).delete(clear_graph))
        .route("/api/bundle", get(get_bundle))
        .route("/api/layout", get(get_layout))
        .route("/api/presets", get(list_presets))
        .route("/api/presets/:slug", post(load_preset))
        .route("/api/modules", post(add_module))
        .route("/api/modules/:id/entry", post(set_entry))
        .route("/api/modules/:id", patch(rename_module).delete(remove_module))
        .route("/api/edges", post(connect))
        .route("/api/edges/:id/toggle", post(toggle_edge))
        .route("/api/edges/:id", delete(remove_edge))
        .route("/__chunkscope_live", get(live::live_websocket))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Graph HTTP server
pub struct GraphServer {
    /// Project configuration
    config: Arc<Config>,

    /// Server options
    options: ServeOptions,
}

impl GraphServer {
    /// Create a new server
    pub fn new(config: Arc<Config>, options: ServeOptions) -> Result<Self> {
        Ok(Self { config, options })
    }

    /// Start serving
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = tokio::net::lookup_host((self.options.host.as_str(), self.options.port))
            .await?
            .next()
            .ok_or_else(|| anyhow::anyhow!("Could not resolve host {}", self.options.host))?;

        let graph = match &self.options.graph_path {
            Some(path) => DependencyGraph::load(path)?,
            None => DependencyGraph::new(),
        };
        for diagnostic in graph.diagnostics() {
            warn!("{}", diagnostic);
        }

        let state = ServerState::new(self.config.clone(), graph);

        if self.options.live {
            if let Some(path) = &self.options.graph_path {
                let watched = state.clone();
                watch_file(path, move |changed| reload_graph(&watched, changed))?;
            }
        }

        let app = router(state);

        info!("Server listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// Reload the graph file after it changed on disk
fn reload_graph(state: &ServerState, path: &std::path::Path) {
    eprintln!(
        "  {} Graph changed: {}",
        "↻".yellow(),
        path.display().to_string().dimmed()
    );

    match DependencyGraph::load(path) {
        Ok(graph) => {
            let snapshot = state.replace(graph);
            info!("Reloaded graph at revision {}", snapshot.revision);
        }
        Err(e) => {
            warn!("Keeping previous graph: {}", e);
            state.report_error(e.to_string());
        }
    }
}

async fn get_graph(State(state): State<Arc<ServerState>>) -> Json<GraphSnapshot> {
    Json(state.snapshot())
}

async fn put_graph(
    State(state): State<Arc<ServerState>>,
    Json(graph): Json<DependencyGraph>,
) -> Json<GraphSnapshot> {
    Json(state.replace(graph))
}

/// Remove every module and edge
async fn clear_graph(State(state): State<Arc<ServerState>>) -> Json<GraphSnapshot> {
    Json(state.replace(DependencyGraph::new()))
}

async fn get_bundle(State(state): State<Arc<ServerState>>) -> Json<BundleSnapshot> {
    Json(state.bundle())
}

/// Current graph with computed positions; the stored graph is not changed
async fn get_layout(State(state): State<Arc<ServerState>>) -> Json<DependencyGraph> {
    let snapshot = state.snapshot();
    Json(layout_graph(&snapshot.graph, &state.config.layout_options()))
}

async fn list_presets() -> Json<Vec<presets::Preset>> {
    Json(presets::all())
}

/// Replace the graph with a laid-out preset
async fn load_preset(
    State(state): State<Arc<ServerState>>,
    axum::extract::Path(slug): axum::extract::Path<String>,
) -> Result<Json<GraphSnapshot>, ApiError> {
    let preset = presets::find(&slug)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Unknown preset '{}'", slug)))?;

    let graph = layout_graph(&preset.graph(), &state.config.layout_options());
    Ok(Json(state.replace(graph)))
}

/// Add a module with a generated id; the first module becomes the entry
async fn add_module(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<NewModule>,
) -> (StatusCode, Json<GraphSnapshot>) {
    let snapshot = state
        .update(|graph| {
            graph.add_module(body.name, body.position);
            true
        })
        .unwrap_or_else(|| state.snapshot());

    (StatusCode::CREATED, Json(snapshot))
}

async fn rename_module(
    State(state): State<Arc<ServerState>>,
    axum::extract::Path(id): axum::extract::Path<String>,
    Json(body): Json<RenameModule>,
) -> Result<Json<GraphSnapshot>, ApiError> {
    edit(&state, "module", &id, |graph| graph.rename_module(&id, body.name))
}

/// Add a static import between two existing modules
async fn connect(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<NewEdge>,
) -> Result<(StatusCode, Json<GraphSnapshot>), ApiError> {
    let mut missing = None;
    let snapshot = state.update(|graph| {
        missing = [&body.source, &body.target]
            .into_iter()
            .find(|id| graph.module(id).is_none())
            .cloned();
        if missing.is_some() {
            return false;
        }

        graph.connect(&body.source, &body.target);
        true
    });

    match (snapshot, missing) {
        (Some(snapshot), _) => Ok((StatusCode::CREATED, Json(snapshot))),
        (None, id) => Err((
            StatusCode::NOT_FOUND,
            format!("Unknown module '{}'", id.unwrap_or_default()),
        )),
    }
}

async fn set_entry(
    State(state): State<Arc<ServerState>>,
    axum::extract::Path(id): axum::extract::Path<String>,
) -> Result<Json<GraphSnapshot>, ApiError> {
    edit(&state, "module", &id, |graph| graph.set_entry(&id))
}

async fn remove_module(
    State(state): State<Arc<ServerState>>,
    axum::extract::Path(id): axum::extract::Path<String>,
) -> Result<Json<GraphSnapshot>, ApiError> {
    edit(&state, "module", &id, |graph| graph.remove_module(&id))
}

async fn toggle_edge(
    State(state): State<Arc<ServerState>>,
    axum::extract::Path(id): axum::extract::Path<String>,
) -> Result<Json<GraphSnapshot>, ApiError> {
    edit(&state, "edge", &id, |graph| graph.toggle_import_kind(&id))
}

async fn remove_edge(
    State(state): State<Arc<ServerState>>,
    axum::extract::Path(id): axum::extract::Path<String>,
) -> Result<Json<GraphSnapshot>, ApiError> {
    edit(&state, "edge", &id, |graph| graph.remove_edge(&id))
}

fn edit<F>(state: &ServerState, what: &str, id: &str, f: F) -> Result<Json<GraphSnapshot>, ApiError>
where
    F: FnOnce(&mut DependencyGraph) -> bool,
{
    state
        .update(f)
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Unknown {} '{}'", what, id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    fn state() -> Arc<ServerState> {
        let graph = presets::find("shared-vendor").unwrap().graph();
        ServerState::new(Arc::new(Config::default()), graph)
    }

    async fn call(state: &Arc<ServerState>, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_get_bundle() {
        let state = state();
        let (status, json) = call(&state, Method::GET, "/api/bundle", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["revision"], 0);
        let kinds: Vec<&str> = json["result"]["chunks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["kind"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, vec!["main", "async", "shared"]);
        assert_eq!(json["annotations"][3]["id"], "utils");
        assert_eq!(json["annotations"][3]["chunkId"], 2);
    }

    #[tokio::test]
    async fn test_edits_bump_revision_and_broadcast() {
        let state = state();
        let mut rx = state.subscribe();

        let (status, json) = call(&state, Method::POST, "/api/edges/app-profile/toggle", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["revision"], 1);

        match rx.recv().await.unwrap() {
            LiveMessage::BundleUpdated { revision, result } => {
                assert_eq!(revision, 1);
                // Profile is now static, so everything is one chunk
                assert_eq!(result.chunks.len(), 1);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let state = state();

        for (method, uri) in [
            (Method::POST, "/api/modules/nope/entry"),
            (Method::DELETE, "/api/modules/nope"),
            (Method::POST, "/api/edges/nope/toggle"),
            (Method::DELETE, "/api/edges/nope"),
            (Method::POST, "/api/presets/nope"),
        ] {
            let (status, _) = call(&state, method, uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        }
        assert_eq!(state.revision(), 0);
    }

    #[tokio::test]
    async fn test_remove_module_and_set_entry() {
        let state = state();

        let (_, json) = call(&state, Method::DELETE, "/api/modules/profile", None).await;
        assert_eq!(json["graph"]["modules"].as_array().unwrap().len(), 4);
        assert_eq!(json["graph"]["edges"].as_array().unwrap().len(), 2);

        let (_, json) = call(&state, Method::POST, "/api/modules/home/entry", None).await;
        assert_eq!(json["revision"], 2);
        assert_eq!(state.snapshot().graph.entry().unwrap().id, "home");

        let (_, json) = call(&state, Method::GET, "/api/bundle", None).await;
        assert_eq!(json["result"]["unreachableModules"], serde_json::json!(["app", "api"]));
    }

    #[tokio::test]
    async fn test_replace_graph_and_layout() {
        let state = state();
        let body = serde_json::json!({
            "modules": [
                { "id": "a", "name": "a.ts", "entry": true },
                { "id": "b", "name": "b.ts" }
            ],
            "edges": [{ "id": "a-b", "source": "a", "target": "b", "kind": "dynamic" }]
        });

        let (status, json) = call(&state, Method::PUT, "/api/graph", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["revision"], 1);

        let (_, json) = call(&state, Method::GET, "/api/layout", None).await;
        assert_eq!(json["modules"][1]["position"]["y"], 140.0);
        // Layout is not stored
        assert_eq!(state.snapshot().graph.modules[1].position.y, 0.0);
    }

    #[tokio::test]
    async fn test_add_rename_and_connect_modules() {
        let state = ServerState::new(Arc::new(Config::default()), DependencyGraph::new());

        let (status, json) = call(&state, Method::POST, "/api/modules", Some(serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["graph"]["modules"][0]["id"], "module-1");
        assert_eq!(json["graph"]["modules"][0]["entry"], true);

        let body = serde_json::json!({ "name": "lazy.ts", "position": { "x": 10.0, "y": 20.0 } });
        let (_, json) = call(&state, Method::POST, "/api/modules", Some(body)).await;
        assert_eq!(json["graph"]["modules"][1]["name"], "lazy.ts");
        assert_eq!(json["graph"]["modules"][1]["entry"], false);
        assert_eq!(json["graph"]["modules"][1]["position"]["y"], 20.0);

        let body = serde_json::json!({ "name": "main.ts" });
        let (status, json) = call(&state, Method::PATCH, "/api/modules/module-1", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["graph"]["modules"][0]["name"], "main.ts");

        let body = serde_json::json!({ "source": "module-1", "target": "module-2" });
        let (status, json) = call(&state, Method::POST, "/api/edges", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["revision"], 4);
        assert_eq!(json["graph"]["edges"][0]["kind"], "static");

        let (_, json) = call(&state, Method::GET, "/api/bundle", None).await;
        assert_eq!(json["result"]["chunks"][0]["modules"], serde_json::json!(["module-1", "module-2"]));
    }

    #[tokio::test]
    async fn test_connect_and_rename_unknown_module() {
        let state = state();

        let body = serde_json::json!({ "source": "app", "target": "ghost" });
        let (status, _) = call(&state, Method::POST, "/api/edges", Some(body)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let body = serde_json::json!({ "name": "ghost.ts" });
        let (status, _) = call(&state, Method::PATCH, "/api/modules/ghost", Some(body)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        assert_eq!(state.revision(), 0);
        assert_eq!(state.snapshot().graph.edges.len(), 5);
    }

    #[tokio::test]
    async fn test_clear_graph() {
        let state = state();

        let (status, json) = call(&state, Method::DELETE, "/api/graph", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["revision"], 1);
        assert!(state.snapshot().graph.is_empty());

        let (_, json) = call(&state, Method::GET, "/api/bundle", None).await;
        assert!(json["result"]["chunks"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_presets() {
        let state = state();

        let (_, json) = call(&state, Method::GET, "/api/presets", None).await;
        assert_eq!(json.as_array().unwrap().len(), 3);
        assert_eq!(json[0]["slug"], "basic");

        let (status, json) = call(&state, Method::POST, "/api/presets/basic", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["graph"]["modules"][0]["id"], "app");
        assert_eq!(json["graph"]["modules"][0]["position"]["x"], 120.0);
    }
}
