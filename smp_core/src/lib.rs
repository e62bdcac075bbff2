use std::{sync::Arc, time::Duration};

use tracing::info;
use zel_core::{prelude::RpcServerBuilder, IrohBundle};

use crate::{
    service::{ParticipantsServer, ParticipantsService, SmpServer, SmpService},
    store::DbStore,
};

pub mod capability;
pub mod config;
pub mod entity;
pub mod error;
pub mod identifier;
pub mod ids;
pub mod models;
pub mod resolver;
pub mod service;
pub mod signing;
pub mod store;
pub mod xml;

pub static ALPN: &[u8] = b"peppol-smp::0.1.0";

/// Main runtime handle for the SMP node.
pub struct SmpCore {
    pub config: config::SmpConfig,

    /// Server bundle that accepts inbound RPC traffic.
    pub server: IrohBundle,

    /// Local handles to the services registered on `server`.
    pub smp: SmpService,
    pub participants: ParticipantsService,
}

impl SmpCore {
    pub async fn start(config: config::SmpConfig) -> Result<Self, Box<dyn std::error::Error>> {
        config.validate()?;

        // DB + migrations
        let db = models::open_or_create_db(&config).await?;
        models::migrate_up(&db).await?;

        let store = Arc::new(DbStore::new(db.clone()));
        let signer = signing::load_signer(
            &config.signing_key_path,
            config.signing_certificate_path.as_deref(),
        );

        let smp = SmpService::new(store, signer, config.base_url.clone());
        let participants = ParticipantsService::new(db);

        // ----------------
        // Server endpoint
        // ----------------
        let mut server_builder = IrohBundle::builder(Some(config.secret_key.clone())).await?;
        let server_endpoint = server_builder.endpoint().clone();

        // Register RPC servers
        let rpc_server_builder = RpcServerBuilder::new(ALPN, server_endpoint);
        let rpc_server_builder = smp.clone().register_service(rpc_server_builder);
        let rpc_server_builder = participants.clone().register_service(rpc_server_builder);

        let rpc_server = rpc_server_builder.build();

        let server = server_builder.accept(ALPN, rpc_server).finish().await;

        server.wait_online().await;
        info!(base_url = %config.base_url, "SMP node online");

        Ok(Self {
            config,
            server,
            smp,
            participants,
        })
    }

    pub async fn shutdown(self) -> Result<(), Box<dyn std::error::Error>> {
        self.server.shutdown(Duration::from_secs(5)).await?;
        info!("SMP node stopped");
        Ok(())
    }
}

pub mod prelude {
    pub use super::capability;
    pub use super::config;
    pub use super::entity;
    pub use super::error;
    pub use super::identifier;
    pub use super::ids;
    pub use super::models;
    pub use super::service;
    pub use super::signing;
    pub use super::store;
    pub use super::xml;

    pub use super::SmpCore;

    pub use zel_core;
}
