use std::io;

use actix_web::{middleware, web, App, HttpServer};
use env_logger::Env;

use vote_ledger::api::{self, AppState};
use vote_ledger::{Config, FileStore, VoteLedger};

#[tokio::main]
async fn main() -> io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|err| {
        log::error!("invalid configuration: {}", err);
        io::Error::new(io::ErrorKind::InvalidInput, err)
    })?;

    let store = FileStore::new(&config.ledger_path);
    let ledger = VoteLedger::open(store, config.candidates.clone()).map_err(|err| {
        log::error!("could not open ledger: {}", err);
        io::Error::new(io::ErrorKind::Other, err)
    })?;

    let state = web::Data::new(AppState::new(ledger));

    log::info!("listening on {}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(api::configure::<FileStore>)
    })
    .bind(config.bind_addr())?
    .run()
    .await
}
