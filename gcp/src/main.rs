//! firebase-jwt: Firebase ID token verification - GCP Cloud Functions adapter
//!
//! Lightweight HTTP server using hyper, deployable as a GCP Cloud Function or Cloud Run service.
//! Uses a single-threaded tokio runtime with a LocalSet (compatible with core's !Send async traits).

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use std::rc::Rc;
use tokio::net::TcpListener;
use tokio::task::LocalSet;
use tracing_subscriber::EnvFilter;

use firebase_jwt_core::config::Config;
use firebase_jwt_core::error::{ApiError, ErrorResponse};
use firebase_jwt_core::{Verifier, VerifyResponse};

mod platform;

use platform::{CachingHttpClient, GcpEnv, SystemClock};

/// Shared application state
struct AppState {
    verifier: Verifier,
    http: CachingHttpClient<SystemClock>,
    clock: SystemClock,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "firebase-jwt-gcp stopped");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".into())
        .parse()
        .map_err(|_| "PORT must be a number")?;

    let config = Config::from_env(&GcpEnv)?;
    let verifier = Verifier::from_config(&config)?;
    tracing::info!(project_id = %verifier.project_id(), "verifier configured");

    let state = Rc::new(AppState {
        verifier,
        http: CachingHttpClient::new(),
        clock: SystemClock,
    });

    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!(port, "firebase-jwt-gcp listening");

    // Connection tasks hold !Send state, so they run on a LocalSet
    let local = LocalSet::new();
    local.run_until(serve(listener, state)).await;
    Ok(())
}

/// Accept connections forever, serving each on its own local task
async fn serve(listener: TcpListener, state: Rc<AppState>) {
    loop {
        let (stream, _) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(error = %e, "accept failed");
                continue;
            }
        };
        let state = state.clone();

        let io = hyper_util::rt::TokioIo::new(stream);
        let service = service_fn(move |req| {
            let state = state.clone();
            async move { handle_request(req, &state).await }
        });

        tokio::task::spawn_local(async move {
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                tracing::warn!(error = %e, "connection error");
            }
        });
    }
}

type HyperResponse = Response<Full<Bytes>>;

async fn handle_request(
    req: Request<Incoming>,
    state: &AppState,
) -> Result<HyperResponse, std::convert::Infallible> {
    Ok(route_request(req, state).await)
}

async fn route_request(req: Request<Incoming>, state: &AppState) -> HyperResponse {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/") => handle_health(),
        (&Method::GET, "/verify") => handle_verify(&req, state).await,
        _ => json_response(StatusCode::NOT_FOUND, &serde_json::json!({"error": "not_found"})),
    }
}

fn handle_health() -> HyperResponse {
    json_response(
        StatusCode::OK,
        &serde_json::json!({
            "name": "firebase-jwt",
            "platform": "gcp"
        }),
    )
}

async fn handle_verify(req: &Request<Incoming>, state: &AppState) -> HyperResponse {
    let auth_header = match authorization_header(req.headers()) {
        Ok(h) => h,
        Err(e) => return error_response(&e),
    };

    match state
        .verifier
        .verify(auth_header, &state.http, &state.clock)
        .await
    {
        Ok(verified) => json_response(StatusCode::OK, &VerifyResponse::from(verified)),
        Err(e) => error_response(&e),
    }
}

/// Raw Authorization header value; a missing header reads as empty
fn authorization_header(headers: &hyper::HeaderMap) -> Result<&str, ApiError> {
    match headers.get(hyper::header::AUTHORIZATION) {
        Some(value) => value
            .to_str()
            .map_err(|_| ApiError::jwt_invalid("invalid Authorization header encoding")),
        None => Ok(""),
    }
}

fn error_response(err: &ApiError) -> HyperResponse {
    if err.is_jwt_error() {
        tracing::info!(error = %err, "token rejected");
    } else {
        tracing::error!(error = %err, "verification error");
    }

    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ErrorResponse::from(err);
    json_response(status, &body)
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: &T) -> HyperResponse {
    let json = serde_json::to_vec(body).unwrap_or_default();
    let mut response = Response::new(Full::new(Bytes::from(json)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_header_missing_is_empty() {
        let headers = hyper::HeaderMap::new();
        assert_eq!(authorization_header(&headers).unwrap(), "");
    }

    #[test]
    fn test_authorization_header_present() {
        let mut headers = hyper::HeaderMap::new();
        headers.insert(
            hyper::header::AUTHORIZATION,
            hyper::header::HeaderValue::from_static("Bearer abc"),
        );
        assert_eq!(authorization_header(&headers).unwrap(), "Bearer abc");
    }

    async fn get_health(stream: &mut tokio::net::TcpStream) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        stream
            .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let mut buf = vec![0u8; 1024];
        let n = stream.read(&mut buf).await.unwrap();
        String::from_utf8_lossy(&buf[..n]).to_string()
    }

    #[tokio::test]
    async fn test_idle_keep_alive_connection_does_not_block_others() {
        use std::time::Duration;
        use tokio::net::TcpStream;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Rc::new(AppState {
            verifier: Verifier::new("demo-project").unwrap(),
            http: CachingHttpClient::new(),
            clock: SystemClock,
        });

        LocalSet::new()
            .run_until(async move {
                tokio::task::spawn_local(serve(listener, state));

                // First client completes a request and keeps the connection open
                let mut idle = TcpStream::connect(addr).await.unwrap();
                assert!(get_health(&mut idle).await.starts_with("HTTP/1.1 200"));

                let mut other = TcpStream::connect(addr).await.unwrap();
                let response = tokio::time::timeout(Duration::from_secs(3), get_health(&mut other))
                    .await
                    .expect("second connection stalled behind idle keep-alive connection");
                assert!(response.starts_with("HTTP/1.1 200"));

                drop(idle);
            })
            .await;
    }

    #[test]
    fn test_error_response_status() {
        let response = error_response(&ApiError::no_matching_key("k"));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = error_response(&ApiError::upstream("down"));
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            response.headers()[hyper::header::CONTENT_TYPE],
            "application/json"
        );
    }
}
