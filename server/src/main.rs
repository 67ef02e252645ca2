use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use clap::Parser;

use server::config::Config;
use server::connection::Gateway;
use server::handlers;
use server::server::spawn_server;
use server::sync_engine::RelaySyncEngine;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    let srv_tx = spawn_server(config.document.clone(), RelaySyncEngine::new());
    let gateway = Gateway::new(srv_tx, config.outbound_buffer);
    let static_dir = config.static_dir.clone();

    log::info!("Server running on port {}", config.port);
    log::info!("Open http://localhost:{} to start drawing", config.port);

    HttpServer::new(move || {
        let static_dir = static_dir.clone();
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(gateway.clone()))
            .configure(move |cfg| handlers::root(cfg, &static_dir))
    })
    .bind(config.bind_address())?
    .run()
    .await
}
