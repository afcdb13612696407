//! Connects a [`path_canvas::Editor`] to the path editor REST API.
//!
//! Edits made in the editor are queued through a [`ChannelSink`] and executed by a
//! background [`SyncWorker`]. The host calls [`EditorBridge::sync_outcomes`] from its
//! frame loop to feed results back. Bulk flows (seeding, layout, path generation,
//! templates) are awaited directly and replace the editor's graph when they finish.

pub mod client;
pub mod config;
pub mod error;
pub mod worker;

pub use client::{
    ApiClient, LayoutAlgorithm, PathGenerationAlgorithm, REQUEST_SEQ_HEADER, SaveAsTemplate,
    Template, TemplateApplication,
};
pub use config::BridgeConfig;
pub use error::{ApiError, Result};
pub use worker::{ChannelSink, SyncWorker};

use async_channel::Receiver;
use path_canvas::sync::{Freshness, SyncOutcome};
use path_canvas::{CanvasConfig, Editor, LogicEvent};
use serde_json::json;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Default reach for nearest-neighbor path generation, in canvas units.
pub const DEFAULT_MAX_DISTANCE: f64 = 200.0;

pub struct EditorBridge {
    client: Arc<ApiClient>,
    sink: ChannelSink,
    outcomes: Receiver<SyncOutcome>,
    worker: JoinHandle<()>,
    config: BridgeConfig,
}

impl EditorBridge {
    /// Starts the sync worker. Must be called from within a tokio runtime.
    pub fn spawn(config: BridgeConfig) -> Result<Self> {
        let client = Arc::new(ApiClient::new(&config)?);
        let (request_tx, request_rx) = async_channel::unbounded();
        let (outcome_tx, outcome_rx) = async_channel::unbounded();
        let worker = tokio::spawn(SyncWorker::new(client.clone(), request_rx, outcome_tx).run());
        tracing::info!(api_url = %client.base_url(), "Editor bridge started");
        Ok(Self {
            client,
            sink: ChannelSink::new(request_tx),
            outcomes: outcome_rx,
            worker,
            config,
        })
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn sink(&self) -> ChannelSink {
        self.sink.clone()
    }

    /// Creates an editor whose edits are synced through this bridge.
    pub fn editor(&self, canvas: CanvasConfig) -> Editor {
        Editor::with_sink(canvas, self.sink())
    }

    /// Feeds every outcome that has already arrived into the editor. Never waits.
    pub fn sync_outcomes(&self, editor: &mut Editor) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.outcomes.try_recv() {
            editor.report_outcome(outcome);
            applied += 1;
        }
        applied
    }

    /// Waits for the next outcome and feeds it into the editor.
    pub async fn next_outcome(&self, editor: &mut Editor) -> Result<Freshness> {
        let outcome = self.outcomes.recv().await.map_err(|_| ApiError::Closed)?;
        Ok(editor.report_outcome(outcome))
    }

    /// Loads the server's graph into the editor.
    #[tracing::instrument(skip(self, editor))]
    pub async fn seed(&self, editor: &mut Editor) -> Result<Vec<LogicEvent>> {
        let nodes = self.client.list_nodes().await?;
        let paths = self.client.list_paths().await?;
        tracing::info!(nodes = nodes.len(), paths = paths.len(), "Seeding editor from server");
        let mut events = editor.replace_nodes(nodes);
        events.extend(editor.replace_paths(paths));
        Ok(events)
    }

    /// Runs a server-side layout and adopts the repositioned nodes.
    #[tracing::instrument(skip(self, editor))]
    pub async fn apply_layout(
        &self,
        editor: &mut Editor,
        algorithm: LayoutAlgorithm,
    ) -> Result<Vec<LogicEvent>> {
        let nodes = match self.client.apply_layout(algorithm).await? {
            Some(nodes) => nodes,
            None => self.client.list_nodes().await?,
        };
        tracing::info!(nodes = nodes.len(), "Layout applied");
        Ok(editor.replace_nodes(nodes))
    }

    /// Generates paths on the server and adopts the result.
    ///
    /// `max_distance` only matters for nearest-neighbor generation and defaults to
    /// [`DEFAULT_MAX_DISTANCE`].
    #[tracing::instrument(skip(self, editor))]
    pub async fn generate_paths(
        &self,
        editor: &mut Editor,
        algorithm: PathGenerationAlgorithm,
        max_distance: Option<f64>,
    ) -> Result<Vec<LogicEvent>> {
        let parameters = match algorithm {
            PathGenerationAlgorithm::NearestNeighbor => {
                json!({ "max_distance": max_distance.unwrap_or(DEFAULT_MAX_DISTANCE) })
            }
            PathGenerationAlgorithm::FullConnectivity => json!({}),
        };
        let paths = match self.client.generate_paths(algorithm, &parameters).await? {
            Some(paths) => paths,
            None => self.client.list_paths().await?,
        };
        tracing::info!(paths = paths.len(), "Paths generated");
        Ok(editor.replace_paths(paths))
    }

    pub async fn list_templates(&self) -> Result<Vec<Template>> {
        self.client.list_templates().await
    }

    /// Saves the editor's current graph as a custom template.
    #[tracing::instrument(skip(self, editor))]
    pub async fn save_as_template(
        &self,
        editor: &Editor,
        name: &str,
        description: Option<String>,
    ) -> Result<Template> {
        let request = SaveAsTemplate {
            name: name.to_string(),
            description,
            layout_type: "custom".to_string(),
            nodes: editor.store().nodes().cloned().collect(),
            paths: editor.store().paths().cloned().collect(),
            is_public: false,
        };
        let template = self.client.save_as_template(&request).await?;
        tracing::info!(template_id = %template.id, "Template saved");
        Ok(template)
    }

    /// Instantiates a template for the configured canvas size and adopts its graph.
    #[tracing::instrument(skip(self, editor))]
    pub async fn apply_template(&self, editor: &mut Editor, id: &str) -> Result<Vec<LogicEvent>> {
        let (width, height) = self.config.canvas_size;
        let result = self.client.apply_template(id, width, height).await?;
        tracing::info!(nodes = result.nodes.len(), paths = result.paths.len(), "Template applied");
        let mut events = editor.replace_nodes(result.nodes);
        events.extend(editor.replace_paths(result.paths));
        Ok(events)
    }

    /// Closes the request queue and waits for the worker to finish dispatching.
    pub async fn shutdown(self) {
        self.sink.close();
        if let Err(e) = self.worker.await {
            tracing::error!(error = %e, "Sync worker panicked");
        }
    }
}
