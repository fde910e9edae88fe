// Módulos de la aplicación
mod abbrev;
mod api;
mod app_state;
mod config;
mod error;
mod ingest;
mod intent;
mod knowledge;
mod math;
mod models;
mod router;
mod session;
mod text;
mod tfidf;

use crate::abbrev::AbbreviationExpander;
use crate::app_state::{AppState, Status};
use crate::intent::IntentSet;
use crate::knowledge::KnowledgeBase;
use crate::router::ResponseRouter;
use anyhow::{Context, Result};
use axum::Router;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tower_http::services::ServeDir;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Cargar .env e inicializar logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 2. Cargar configuración
    let cfg = config::AppConfig::from_env().context("Error al cargar la configuración")?;

    // 3. Cargar datos estáticos: base de conocimiento, intenciones y abreviaturas
    let knowledge = KnowledgeBase::load(&cfg.knowledge_base_path)?;
    let intents = IntentSet::load(&cfg.intents_path)?;
    let abbreviations = AbbreviationExpander::load(&cfg.abbreviations_path)?;
    if knowledge.is_empty() {
        warn!("La base de conocimiento está vacía: las preguntas generales no tendrán respuesta.");
    }
    if intents.is_empty() {
        warn!("No hay intenciones cargadas.");
    }

    let rng = match cfg.reply_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // Crear canal para la señal de apagado.
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    // 4. Crear estado compartido de la aplicación
    let app_state = AppState {
        config: cfg.clone(),
        router: Arc::new(ResponseRouter::new(knowledge, intents)),
        preprocessor: Arc::new(abbreviations),
        session: Arc::new(Mutex::new(None)),
        rng: Arc::new(Mutex::new(rng)),
        http: ingest::http_client(cfg.fetch_timeout)?,
        status: Arc::new(Mutex::new(Status {
            is_busy: false,
            message: "Servidor listo.".to_string(),
        })),
        shutdown_sender: Arc::new(Mutex::new(Some(shutdown_tx))),
    };

    // 5. Configurar el router de la API y el servicio de ficheros estáticos.
    // Sólo el frontend servido aquí puede llamar a la API desde el navegador.
    let server_addr = &app_state.config.server_addr;
    let server_url = format!("http://{}", server_addr);
    let app = Router::new()
        .merge(api::create_router(app_state.clone()))
        .fallback_service(ServeDir::new(&cfg.frontend_dir))
        .layer(api::cors_layer(&server_url).context("Origen CORS inválido")?);

    // 6. Iniciar el servidor
    let listener = tokio::net::TcpListener::bind(server_addr)
        .await
        .with_context(|| format!("No se pudo escuchar en {server_addr}"))?;
    info!("🚀 Servidor escuchando en {}", &server_url);

    // Abrir el frontend en el navegador por defecto
    if cfg.open_browser && webbrowser::open(&server_url).is_err() {
        info!("No se pudo abrir el navegador. Por favor, accede a {} manualmente.", server_url);
    }

    // Configurar el apagado ordenado.
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
            info!("Señal de apagado recibida, iniciando cierre del servidor.");
        })
        .await
        .context("Error en el servidor HTTP")?;

    info!("✅ Servidor cerrado correctamente.");
    Ok(())
}
