//! Inspector Web Server
//!
//! HTTP server for the picker UI. One page context is loaded per server.

use anyhow::Result;
use axum::{
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use colored::Colorize;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use super::api::{self, AppState};
use crate::context::spawn_page_context;
use crate::controller::{Controller, StateStore};
use crate::dom::load_html;
use crate::utils::Config;

/// Inspector server configuration
pub struct InspectorConfig {
    pub port: u16,
    /// URL or file path of the page to load
    pub source: String,
}

/// Main inspector server
pub struct InspectorServer {
    config: InspectorConfig,
    app: Config,
}

impl InspectorServer {
    pub fn new(config: InspectorConfig, app: Config) -> Self {
        Self { config, app }
    }

    /// Load the page and serve until interrupted
    pub async fn start(&self) -> Result<()> {
        let html = load_html(&self.config.source).await?;
        let (client, pushes) = spawn_page_context(html, &self.app)?;
        let controller =
            Controller::with_store(client.clone(), StateStore::new(&self.app.state_file))?;

        let state = Arc::new(AppState {
            controller: Mutex::new(controller),
            client,
            pushes: Mutex::new(pushes),
        });

        let app = Router::new()
            .route("/", get(serve_index))
            .merge(api::api_router())
            .layer(CorsLayer::permissive())
            .with_state(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        info!("Inspector listening on {}", addr);

        println!("\n{} Inspector started!", "🔍".cyan());
        println!("   Open: http://localhost:{}", self.config.port);
        println!("   Page: {}", self.config.source);
        println!("   State: {}", self.app.state_file.display());
        println!("\n   Press Ctrl+C to stop.\n");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app.into_make_service()).await?;

        Ok(())
    }
}

/// Serve the UI page
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("ui/index.html"))
}
