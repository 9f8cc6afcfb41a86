/// Long-running HTTP front end for the kill-chain analyst.
///
/// Keeps one process (and one knowledge store handle) alive so repeated
/// queries skip the store initialisation cost.
///
/// # Usage
///
/// ```bash
/// KILLCHAIN_SERVICE_PORT=3300 killchain-service
/// curl -s localhost:3300/api/analyze -d '{"query":"Log4Shell analysis"}' \
///      -H 'content-type: application/json'
/// ```
#[tokio::main]
async fn main() {
    if let Err(err) = killchain_lib::interfaces::http::run_http_service().await {
        eprintln!("[killchain::service] Service failed: {err:?}");
        std::process::exit(1);
    }
}
