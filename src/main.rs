use actix_cors::*;
use actix_web::*;

use log::*;
use std::process::exit;
use std::thread;
use std::time::Duration;

mod availability;
mod config;
mod feed;
mod routes;
mod venue;

use config::Config;
use feed::FeedClient;
use routes::{get_availability, AppState};

/// Builds the shared state and runs the actix_web server until it is
/// stopped.
async fn async_main(config: Config) -> std::io::Result<()> {
    let feed = FeedClient::new(&config).map_err(|err| {
        std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("could not build booking feed client: {}", err),
        )
    })?;

    let state = web::Data::new(AppState {
        feed,
        target_hours: config.target_hours.clone(),
    });

    info!("Listening on {}", config.address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_header()
            .allowed_methods(vec!["GET"])
            .send_wildcard()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .service(get_availability)
    })
    .bind(&config.address)?
    .run()
    .await
}

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    ctrlc::set_handler(move || {
        info!("Exiting...");
        thread::sleep(Duration::from_secs(2));
        exit(0);
    })
    .expect("Error setting Ctrl-C handler");

    info!("Court availability server starting up...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("Invalid configuration: {}", err);
            exit(1);
        }
    };

    info!(
        "Checking hours {:?} against {} in {:?}",
        config.target_hours, config.base_url, config.venue_zone
    );

    let result = actix_web::rt::System::with_tokio_rt(|| {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .worker_threads(1)
            .thread_name("main-tokio")
            .build()
            .expect("Error building tokio runtime")
    })
    .block_on(async_main(config));

    if let Err(err) = result {
        error!("Server stopped: {}", err);
        exit(1);
    }
}
