//! Local HTTP endpoint that receives the Spotify login redirect.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use reqwest::Url;
use serde::Deserialize;
use spotibot_core::auth::Authenticator;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const LANDING_PAGE: &str = "<!doctype html><title>spotibot</title>\
<p>You can close this tab and return to the terminal.</p>";

#[derive(Clone)]
struct CallbackState {
    auth: Arc<Authenticator>,
    /// Login result for the UI.
    done_tx: mpsc::Sender<bool>,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// `host:port` to bind and the callback path, taken from the redirect URI.
pub fn callback_target(redirect_uri: &str) -> anyhow::Result<(String, String)> {
    let url = Url::parse(redirect_uri)?;
    let host = url
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("redirect uri has no host: {}", redirect_uri))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| anyhow::anyhow!("redirect uri has no port: {}", redirect_uri))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let addr = if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    };
    Ok((addr, url.path().to_string()))
}

pub fn router(auth: Arc<Authenticator>, path: &str, done_tx: mpsc::Sender<bool>) -> Router {
    let mut app = Router::new().route(path, get(callback));
    if path != "/" {
        app = app.route("/", get(landing));
    }
    app.with_state(CallbackState { auth, done_tx })
}

/// Bind the callback listener and serve it in the background.
pub async fn start_server(
    auth: Arc<Authenticator>,
    done_tx: mpsc::Sender<bool>,
) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    let (addr, path) = callback_target(auth.redirect_uri())?;
    let listener = TcpListener::bind(&addr).await?;
    info!("login callback listening on http://{}{}", addr, path);
    let app = router(auth, &path, done_tx);
    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("callback server error: {}", e);
        }
    }))
}

async fn callback(State(s): State<CallbackState>, Query(q): Query<CallbackQuery>) -> Response {
    if let Some(err) = q.error {
        warn!("spotify login was not granted: {}", err);
        let _ = s.done_tx.send(false).await;
        return Redirect::to("/").into_response();
    }
    let Some(code) = q.code else {
        return landing().await.into_response();
    };
    let ok = s.auth.handle_callback(&code, q.state.as_deref()).await;
    let _ = s.done_tx.send(ok).await;
    // Drop the code from the browser's address bar.
    Redirect::to("/").into_response()
}

async fn landing() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spotibot_core::config::SpotifyConfig;

    #[test]
    fn test_callback_target() {
        let (addr, path) = callback_target("http://127.0.0.1:8888/callback").unwrap();
        assert_eq!(addr, "127.0.0.1:8888");
        assert_eq!(path, "/callback");

        let (addr, path) = callback_target("http://localhost/").unwrap();
        assert_eq!(addr, "localhost:80");
        assert_eq!(path, "/");

        let (addr, _) = callback_target("http://[::1]:9000/cb").unwrap();
        assert_eq!(addr, "[::1]:9000");

        assert!(callback_target("not a url").is_err());
    }

    async fn serve_test(auth: Arc<Authenticator>) -> (String, mpsc::Receiver<bool>) {
        let (tx, rx) = mpsc::channel(4);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let app = router(auth, "/callback", tx);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (base, rx)
    }

    fn no_redirects() -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap()
    }

    fn authenticator(dir: &std::path::Path) -> Arc<Authenticator> {
        let config = SpotifyConfig {
            client_id: "id".into(),
            client_secret: "secret".into(),
            ..SpotifyConfig::default()
        };
        Arc::new(Authenticator::new(config, dir.join("token.json")))
    }

    #[tokio::test]
    async fn test_unexpected_callback_redirects_and_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let auth = authenticator(dir.path());
        let (base, mut rx) = serve_test(auth.clone()).await;

        // No login was started, so the code is ignored without a token request.
        let resp = no_redirects()
            .get(format!("{}/callback?code=abc&state=xyz", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()["location"], "/");
        assert_eq!(rx.recv().await, Some(false));
        assert!(!auth.is_logged_in());
    }

    #[tokio::test]
    async fn test_denied_login_and_landing_page() {
        let dir = tempfile::tempdir().unwrap();
        let (base, mut rx) = serve_test(authenticator(dir.path())).await;
        let client = no_redirects();

        let resp = client
            .get(format!("{}/callback?error=access_denied&state=s", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::SEE_OTHER);
        assert_eq!(rx.recv().await, Some(false));

        let page = client.get(format!("{}/", base)).send().await.unwrap();
        assert!(page.status().is_success());
        assert!(page.text().await.unwrap().contains("return to the terminal"));
    }
}
