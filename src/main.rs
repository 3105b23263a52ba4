use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use quizgate_server::{
    app_state::AppState,
    config::Config,
    graphql::create_schema,
    handlers::{configure, graphiql, graphql},
    middleware::RequestIdMiddleware,
};

fn cors(config: &Config) -> Cors {
    match &config.cors_allowed_origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allowed_methods(vec!["GET", "POST"])
            .allow_any_header()
            .max_age(3600),
        None => Cors::default(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env();
    config
        .validate()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    let state = AppState::new(config.clone())
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let sweeper = config
        .sweep_interval()
        .map(|interval| std::sync::Arc::new(state.sweeper()).spawn(interval));

    let schema = create_schema(state.clone());
    let bind = (config.web_server_host.clone(), config.web_server_port);

    log::info!("Starting HTTP server on {}:{}", bind.0, bind.1);
    log::info!(
        "Tokens valid for {}ms, subject partitioning {}",
        config.validity_window_ms,
        if config.subject_partitioning { "on" } else { "off" }
    );
    log::info!("GraphiQL playground: http://{}:{}/graphiql", bind.0, bind.1);

    let server_config = config.clone();
    let result = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(schema.clone()))
            .wrap(Logger::default())
            .wrap(RequestIdMiddleware)
            .wrap(cors(&server_config))
            .configure(configure)
            .service(graphql)
            .service(graphiql)
    })
    .bind(bind)?
    .run()
    .await;

    if let Some(handle) = sweeper {
        handle.abort();
    }

    result
}
