use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use fluentia::{app_config, auth::AuthMiddleware, config::Config, db};
use log::{error, info};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
        }
    };

    let pool = db::connect(&config).await.map_err(|e| {
        error!("failed to connect to the database: {}", e);
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e)
    })?;
    db::migrate(&pool)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let bind_address = (config.server_host.clone(), config.server_port);
    info!("starting Fluentia server at {}", config.server_url());

    let config = web::Data::new(config);
    let pool = web::Data::new(pool);

    HttpServer::new(move || {
        App::new()
            .wrap(AuthMiddleware)
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(pool.clone())
            .app_data(config.clone())
            .configure(app_config)
    })
    .bind(bind_address)?
    .run()
    .await
}
