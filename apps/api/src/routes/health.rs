/// GET /health
/// Liveness probe; always plain-text "OK".
pub async fn health_handler() -> &'static str {
    "OK"
}
