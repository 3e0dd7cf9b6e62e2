//! API Server Module
//!
//! Builds the route table and runs the HTTP server. Handlers depend only
//! on the capability traits in [`AppState`], so the whole router can be
//! exercised in tests against in-memory fakes.

use super::handlers;
use crate::auth::{self, TokenAuthority};
use crate::config::Config;
use crate::ledger::VotingLedger;
use crate::media::MediaStore;
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::sync::Arc;
use tracing::info;

/// Shared application state injected into every request handler.
///
/// One ledger client and one media client per process, constructed once
/// at startup; both serialize their own requests internally, so the
/// handles need no locking here.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn VotingLedger>,
    pub media: Arc<dyn MediaStore>,
    pub tokens: Arc<TokenAuthority>,
}

/// The HTTP server: configuration plus the injected application state.
pub struct Server {
    config: Config,
    state: AppState,
}

impl Server {
    /// Assemble the server from its dependencies.
    pub fn new(config: Config, ledger: Arc<dyn VotingLedger>, media: Arc<dyn MediaStore>) -> Self {
        let tokens = Arc::new(TokenAuthority::new(&config.auth));
        let state = AppState {
            ledger,
            media,
            tokens,
        };
        Self { config, state }
    }

    /// Bind to the configured address and serve requests until shutdown.
    pub async fn start(self) -> anyhow::Result<()> {
        let app = router(self.state);

        let addr = format!("{}:{}", self.config.api.host, self.config.api.port);
        info!("API server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// Build the full route table.
///
/// Three tiers: public (register/login/status), token-gated reads and
/// voting, and admin-gated mutations. The gates pass everything through
/// when `auth.enforce` is off, matching the original deployments.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(handlers::welcome))
        .route("/api", get(handlers::api_welcome))
        .route("/api/register", post(handlers::register))
        .route("/api/login", post(handlers::login))
        .route("/api/tx-status/:tx_hash", get(handlers::tx_status));

    let authed = Router::new()
        .route("/api/votings", get(handlers::list_votings))
        .route("/api/voting/:id", get(handlers::voting_details))
        .route("/api/candidates/:id", get(handlers::list_candidates))
        .route("/api/vote", post(handlers::vote))
        .route("/api/vote/result/:id", get(handlers::vote_result))
        .route("/api/vote/history", get(handlers::vote_history))
        .route("/api/results", get(handlers::all_results))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    // Layer order matters: require_auth is added last so it runs first
    // and inserts the claims require_admin checks.
    let admin = Router::new()
        .route("/api/voting/create", post(handlers::create_voting))
        .route("/api/voting/update/:id", post(handlers::update_voting))
        .route("/api/voting/delete/:id", post(handlers::delete_voting))
        .route("/api/candidate/add/:id", post(handlers::add_candidate))
        .route(
            "/api/candidate/update/:id/:cid",
            post(handlers::update_candidate),
        )
        .route(
            "/api/candidate/delete/:id/:cid",
            post(handlers::delete_candidate),
        )
        .route("/api/users", get(handlers::list_users))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(authed)
        .merge(admin)
        .with_state(state)
}
