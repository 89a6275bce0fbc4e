use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use domain_auth_checker::{CheckConfig, DnsResolver, DomainChecker};
use env_logger::Env;
use serde::Deserialize;

#[derive(Deserialize)]
struct CheckQuery {
    domain: String,
}

async fn check_domain(
    checker: web::Data<DomainChecker<DnsResolver>>,
    query: web::Query<CheckQuery>,
) -> impl Responder {
    match checker.check_domain(&query.domain).await {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({
            "error": e.to_string(),
        })),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    log::info!("Starting Domain Auth Checker Service");

    let config = CheckConfig::default();
    let resolver = DnsResolver::new(&config)
        .map_err(|e| std::io::Error::other(format!("DNS resolver init failed: {e}")))?;
    let checker = web::Data::new(DomainChecker::new(resolver, config));

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Binding to {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(checker.clone())
            .route("/api/check-domain", web::get().to(check_domain))
            .wrap(actix_web::middleware::Logger::default())
    })
    .workers(num_cpus::get())         // spawn one worker per CPU core
    .keep_alive(std::time::Duration::from_secs(75)) // typical production keep-alive
    .max_connections(1_000)          // limit simultaneous connections
    .bind((host.as_str(), port))?     // bind to dynamic host/port
    .run()
    .await
}
