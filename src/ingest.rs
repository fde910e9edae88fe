//! Obtención del texto de un documento (fichero subido, URL o texto pegado)
//! y creación del contexto de extracción a partir de él.

use std::{path::Path, time::Duration};

use mime_guess::MimeGuess;
use scraper::{ElementRef, Html};
use tracing::{info, warn};
use url::Url;

use crate::error::{AssistantError, AssistantResult};
use crate::models::DocumentSource;
use crate::session::ExtractionContext;

/// Extensiones que se leen directamente como texto UTF-8.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "csv", "json", "log"];
const HTML_EXTENSIONS: &[&str] = &["html", "htm"];
/// Etiquetas cuyo contenido no es texto del documento.
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg"];
const BLOCK_TAGS: &[&str] = &[
    "p", "br", "div", "li", "tr", "td", "th", "h1", "h2", "h3", "h4", "h5", "h6", "title",
    "section", "article", "header", "footer", "blockquote", "pre",
];

/// Extrae el texto de un fichero subido por el usuario. `name` sólo se usa
/// para decidir el formato; nunca se abre como ruta. Operación bloqueante.
pub fn read_upload_text(name: &str, bytes: &[u8]) -> AssistantResult<String> {
    let extension = Path::new(name)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("")
        .to_lowercase();

    if extension == "pdf" {
        return pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
            warn!("No se pudo extraer texto del PDF {}: {}", name, e);
            AssistantError::UnsupportedFormat(format!("PDF ilegible ({e})"))
        });
    }

    let is_html = HTML_EXTENSIONS.contains(&extension.as_str());
    let is_text = is_html
        || TEXT_EXTENSIONS.contains(&extension.as_str())
        || MimeGuess::from_path(name)
            .first()
            .is_some_and(|mime| mime.type_() == mime_guess::mime::TEXT);
    if !is_text {
        info!("Extensión no soportada ('.{}'): {}", extension, name);
        return Err(AssistantError::UnsupportedFormat(format!(".{extension}")));
    }

    let content = std::str::from_utf8(bytes).map_err(|_| {
        warn!("Fichero no UTF-8: {}", name);
        AssistantError::UnsupportedFormat("texto no UTF-8".to_string())
    })?;
    Ok(if is_html { html_to_text(content) } else { content.to_string() })
}

/// Cliente HTTP para descargar documentos con el timeout configurado.
pub fn http_client(timeout: Duration) -> AssistantResult<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Comprueba que la URL sea http(s).
pub fn parse_document_url(raw: &str) -> AssistantResult<Url> {
    let url = Url::parse(raw.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AssistantError::InvalidUrl(format!("esquema no soportado: {other}"))),
    }
}

/// Descarga el texto de una URL. El HTML se reduce a texto plano.
pub async fn fetch_url_text(client: &reqwest::Client, url: &Url) -> AssistantResult<String> {
    info!("Descargando documento de {url}...");
    let response = client.get(url.clone()).send().await?.error_for_status()?;
    let is_html = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("html"));
    let body = response.text().await?;
    Ok(if is_html { html_to_text(&body) } else { body })
}

/// Construye el contexto de extracción. Rechaza documentos sin frases útiles.
pub fn analyze_document(source: DocumentSource, text: String) -> AssistantResult<ExtractionContext> {
    let context = ExtractionContext::analyze(source, text);
    if !context.has_corpus() {
        return Err(AssistantError::EmptyDocument(context.source().to_string()));
    }
    info!(
        "Documento analizado ({}): {} frases, {} palabras en el vocabulario.",
        context.source(),
        context.corpus().len(),
        context.idf().len()
    );
    Ok(context)
}

/// Texto visible de una página. `<script>`, `<style>` y similares se
/// descartan; los bloques (`p`, `br`, `li`, títulos...) se convierten en
/// saltos de línea para que el corpus separe frases. Las entidades las
/// decodifica el parser.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::with_capacity(html.len());
    collect_text(document.root_element(), &mut out);
    out
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(el) = ElementRef::wrap(child) {
            let name = el.value().name();
            if SKIPPED_TAGS.contains(&name) {
                continue;
            }
            let is_block = BLOCK_TAGS.contains(&name);
            if is_block {
                out.push('\n');
            }
            collect_text(el, out);
            if is_block {
                out.push('\n');
            }
        }
    }
}
