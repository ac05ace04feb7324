// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;

use crate::configuration::ProxyOptions;
use crate::provider::CredentialsProvider;
use crate::routes;

pub struct AppState {
    pub credentials: Arc<CredentialsProvider>,
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(
        options: ProxyOptions,
        credentials: Arc<CredentialsProvider>,
    ) -> Result<Self, std::io::Error> {
        let address = format!("{}:{}", options.host, options.port);
        let listener = TcpListener::bind(address).await?;
        let port = listener.local_addr()?.port();
        let router = create_router(credentials);

        tracing::info!("[proxy] listening at http://{}:{}", options.host, port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }
}

/// Builds the router. Handlers read the caller address from
/// [`ConnectInfo`](axum::extract::ConnectInfo), so the router must be served
/// with connect info (or given a `MockConnectInfo` layer in tests).
pub fn create_router(credentials: Arc<CredentialsProvider>) -> Router {
    let state = Arc::new(AppState { credentials });

    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/latest/meta-data/iam/security-credentials",
            get(routes::list_roles),
        )
        .route(
            "/latest/meta-data/iam/security-credentials/",
            get(routes::list_roles),
        )
        .route(
            "/latest/meta-data/iam/security-credentials/{role}",
            get(routes::get_credentials),
        )
        .with_state(state)
}
