use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    response::{
        Html, IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use multilocale_core::{BuildMode, RouteTable, SiteConfig};
use multilocale_generator::{
    ChangeKind, DevRequest, IncrementalRebuilder, RebuildAction, ReloadSignal, SiteBuilder,
    SourceChange, route_request,
};
use notify::event::ModifyKind;
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::broadcast;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use super::build::print_report;
use super::load_site;

const RELOAD_SCRIPT: &str = r#"<script>
  // Live reload via Server-Sent Events
  (function () {
    const eventSource = new EventSource('/_reload');
    eventSource.onmessage = () => location.reload();
    eventSource.onerror = () => {
      console.log('Preview server disconnected');
      eventSource.close();
    };
  })();
</script>"#;

#[derive(Clone)]
struct AppState {
    config: Arc<SiteConfig>,
    reload_tx: broadcast::Sender<()>,
}

/// Forwards rebuild notifications to connected browsers.
struct BroadcastReload(broadcast::Sender<()>);

impl ReloadSignal for BroadcastReload {
    fn full_reload(&self) {
        // no subscribers is fine
        let _ = self.0.send(());
    }
}

/// Start preview server with rebuild on change and live reload.
///
/// This command:
/// - Loads site.toml and runs a development build
/// - Serves the output with the same URL layout as production
/// - Watches sources and rebuilds the affected pages
/// - Tells open pages to reload after every rebuild
pub async fn run(path: PathBuf, port: u16) -> Result<()> {
    let (root, config) = load_site(&path)?;

    println!("🌍 Starting preview server...");
    println!("   Site: {}", root.display());

    let mut builder = SiteBuilder::new(config.clone(), BuildMode::Development);
    let report = tokio::task::block_in_place(|| builder.build_all()).context("Initial build failed")?;
    print_report(&report);

    let (reload_tx, _) = broadcast::channel::<()>(100);
    let rebuilder = IncrementalRebuilder::new(builder, BroadcastReload(reload_tx.clone()));

    let state = AppState {
        config: Arc::new(config),
        reload_tx,
    };

    let app = Router::new()
        .route("/_reload", get(sse_handler))
        .fallback(site_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tokio::spawn(async move {
        if let Err(e) = watch_files(root, rebuilder).await {
            tracing::error!(error = %e, "File watcher stopped");
        }
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("\n🚀 Preview ready at: http://localhost:{}", port);
    println!("   Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to port")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Watch the site directory and feed changes to the rebuilder
async fn watch_files(root: PathBuf, mut rebuilder: IncrementalRebuilder<BroadcastReload>) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::channel(100);

    let mut watcher =
        notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        })?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    while let Some(event) = rx.recv().await {
        for change in source_changes(&event) {
            match tokio::task::block_in_place(|| rebuilder.on_change(&change)) {
                Ok(RebuildAction::Rebuilt(_, report)) => {
                    println!("   📝 {} changed, rebuilt", display_name(&change.path));
                    if report.has_failures() {
                        print_report(&report);
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(path = %change.path.display(), error = %e, "Rebuild failed"),
            }
        }
    }

    Ok(())
}

fn source_changes(event: &NotifyEvent) -> Vec<SourceChange> {
    event
        .paths
        .iter()
        .filter(|p| !is_temporary(p))
        .filter_map(|p| {
            let kind = match event.kind {
                EventKind::Create(_) => ChangeKind::Added,
                EventKind::Remove(_) => ChangeKind::Removed,
                EventKind::Modify(ModifyKind::Name(_)) if p.exists() => ChangeKind::Added,
                EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Removed,
                EventKind::Modify(_) => ChangeKind::Modified,
                _ => return None,
            };
            Some(SourceChange::new(p.clone(), kind))
        })
        .collect()
}

/// Editor swap files and hidden files
fn is_temporary(path: &Path) -> bool {
    let filename = path.file_name().unwrap_or_default().to_string_lossy();
    filename.starts_with('.') || filename.ends_with('~')
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

/// SSE endpoint for live reload
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl futures::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let mut rx = state.reload_tx.subscribe();

    let stream = async_stream::stream! {
        loop {
            if rx.recv().await.is_ok() {
                yield Ok(Event::default().data("reload"));
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Serve the output directory with production URL semantics
async fn site_handler(State(state): State<AppState>, request: Request) -> Response {
    let config = &state.config;
    let output = &config.paths.output;
    // routes may change while previewing
    let routes = RouteTable::load(&config.paths.routes, &config.locales);

    let target = route_request(request.uri().path(), &routes);
    tracing::debug!(path = %request.uri().path(), target = ?target, "Dev request");

    match target {
        DevRequest::RootRedirect => serve_file(output.join("index.html"), request).await,
        DevRequest::Asset(file) | DevRequest::Page(file) | DevRequest::Legacy(file) => {
            serve_file(output.join(file), request).await
        }
        DevRequest::PassThrough => match ServeDir::new(output).oneshot(request).await {
            Ok(response) => response.into_response(),
            Err(never) => match never {},
        },
    }
}

async fn serve_file(path: PathBuf, request: Request) -> Response {
    if path.extension().is_some_and(|ext| ext == "html") {
        return match tokio::fs::read_to_string(&path).await {
            Ok(html) => Html(inject_reload_script(&html)).into_response(),
            Err(_) => (StatusCode::NOT_FOUND, Html(not_found_page(&path))).into_response(),
        };
    }
    match ServeFile::new(&path).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

fn inject_reload_script(html: &str) -> String {
    match html.rfind("</body>") {
        Some(pos) => format!("{}{}\n{}", &html[..pos], RELOAD_SCRIPT, &html[pos..]),
        None => format!("{}\n{}", html, RELOAD_SCRIPT),
    }
}

fn not_found_page(path: &Path) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><head><title>Not built</title></head><body>
<h1>Not built</h1>
<pre>{}</pre>
{}
</body></html>"#,
        path.display(),
        RELOAD_SCRIPT
    )
}
