use anyhow::Context;
use bookshelf_app::modules::books::store;
use bookshelf_kernel::{settings::Settings, InitCtx};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;
    bookshelf_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        port = settings.server.port,
        "bookshelf-app bootstrap starting"
    );

    let document_store = bookshelf_db::connect(&settings.database)
        .await
        .context("failed to open document store")?;
    tracing::info!(backend = document_store.kind(), "document store ready");

    let registry = bookshelf_app::registry(
        store::open(&document_store, &settings.database),
        &settings,
    );

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    tracing::info!("bookshelf-app bootstrap complete");

    let served =
        bookshelf_http::start_server(&registry, &settings, bookshelf_http::shutdown_signal()).await;

    registry.stop_modules().await?;
    served
}
