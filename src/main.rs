use std::{net::SocketAddr, sync::Arc};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use thumbgallery::config::Args;
use thumbgallery::fs_utils::{prepare_dir, remove_dir, SUPPORTED_EXTENSIONS};
use thumbgallery::gallery::Gallery;
use thumbgallery::image_utils::Thumbnailer;
use thumbgallery::index::EntryIndex;
use thumbgallery::server::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("thumbgallery=info,tower_http=info")),
        )
        .init();

    let config = Args::parse().into_config()?;

    let mut entries = EntryIndex::build(&config.root)?;
    if entries.is_empty() {
        return Err(anyhow!(
            "No supported image files found in {}. Supported formats are: {}",
            config.root.display(),
            SUPPORTED_EXTENSIONS.join(", ")
        ));
    }
    if let Some(seed) = config.seed {
        info!("shuffling {} images with seed {seed}", entries.len());
        entries.shuffle(seed);
    }
    let entries = Arc::new(entries);

    let thumb_dir = prepare_dir(&config.thumb_dir)
        .with_context(|| format!("Unable to create {}", config.thumb_dir.display()))?;
    let converter = Arc::new(Thumbnailer::new(
        &thumb_dir,
        config.thumb_height,
        config.quality,
    ));
    let gallery = Arc::new(
        Gallery::start(Arc::clone(&entries), &config, converter)
            .context("Unable to start thumbnail workers")?,
    );

    // Warm the first screen while the listener comes up.
    let warm = Arc::clone(&gallery);
    let warm = tokio::task::spawn_blocking(move || {
        if let Err(err) = warm.prefetch(0) {
            warn!("initial prefetch failed: {err}");
        }
    });

    let app = router(
        AppState {
            gallery: Arc::clone(&gallery),
        },
        &config,
    );
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Unable to listen on {addr}"))?;
    info!(
        "serving {} images from {} on http://{addr}/gallery",
        entries.len(),
        config.root.display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Workers must be gone before their output directory is.
    gallery.shutdown();
    if let Err(err) = warm.await {
        error!("initial prefetch task failed: {err}");
    }
    info!("removing thumbnail directory {}", thumb_dir.display());
    if let Err(err) = remove_dir(&thumb_dir) {
        error!("unable to remove {}: {err}", thumb_dir.display());
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("unable to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("unable to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("received SIGINT/SIGTERM, shutting down");
}
