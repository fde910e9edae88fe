use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use tokio::sync::oneshot;

use crate::{
    abbrev::Preprocessor, config::AppConfig, models::SessionInfo, router::ResponseRouter,
    session::ExtractionContext,
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    /// Base de conocimiento e intenciones: inmutables tras el arranque.
    pub router: Arc<ResponseRouter>,
    pub preprocessor: Arc<dyn Preprocessor>,
    /// Única sesión de extracción del proceso.
    pub session: Arc<Mutex<Option<ExtractionContext>>>,
    pub rng: Arc<Mutex<StdRng>>,
    pub http: reqwest::Client,
    pub status: Arc<Mutex<Status>>,
    pub shutdown_sender: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl AppState {
    /// Sustituye la sesión completa. Si dos análisis terminan a la vez,
    /// se queda el último en llegar.
    pub fn install_session(&self, context: ExtractionContext) -> SessionInfo {
        let info = context.info();
        *self.session.lock().unwrap() = Some(context);
        info
    }

    pub fn session_info(&self) -> Option<SessionInfo> {
        self.session.lock().unwrap().as_ref().map(ExtractionContext::info)
    }

    pub fn set_status(&self, is_busy: bool, message: impl Into<String>) {
        let mut status = self.status.lock().unwrap();
        status.is_busy = is_busy;
        status.message = message.into();
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Status {
    pub is_busy: bool,
    pub message: String,
}
