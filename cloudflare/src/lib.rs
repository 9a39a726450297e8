//! firebase-jwt: Firebase ID token verification - Cloudflare Workers adapter

use worker::*;

use firebase_jwt_core::config::Config;
use firebase_jwt_core::error::{ApiError, ErrorResponse};
use firebase_jwt_core::{Verifier, VerifyResponse};

mod platform;

use platform::{JsClock, WorkersEnv, WorkersFetchClient};

#[event(fetch)]
async fn main(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    let router = Router::new();

    router
        .get("/", |_, _| handle_health())
        .get_async("/verify", handle_verify)
        .run(req, env)
        .await
}

fn handle_health() -> Result<Response> {
    Response::from_json(&serde_json::json!({
        "name": "firebase-jwt",
        "platform": "cloudflare"
    }))
}

async fn handle_verify(req: Request, ctx: RouteContext<()>) -> Result<Response> {
    let wenv = WorkersEnv::new(&ctx.env);
    let verifier = match Config::from_env(&wenv).and_then(|config| Verifier::from_config(&config)) {
        Ok(v) => v,
        Err(e) => return error_response(&e),
    };

    let auth_header = match req.headers().get("Authorization") {
        Ok(value) => value.unwrap_or_default(),
        Err(_) => return error_response(&ApiError::jwt_invalid("failed to read headers")),
    };

    match verifier
        .verify(&auth_header, &WorkersFetchClient, &JsClock)
        .await
    {
        Ok(verified) => Response::from_json(&VerifyResponse::from(verified)),
        Err(e) => error_response(&e),
    }
}

/// Convert ApiError to worker::Response
fn error_response(err: &ApiError) -> Result<Response> {
    if err.is_jwt_error() {
        console_log!("token rejected: {}", err);
    } else {
        console_error!("verification error: {}", err);
    }

    let status = err.status_code();
    let body = ErrorResponse::from(err);
    Response::from_json(&body).map(|r| r.with_status(status))
}
