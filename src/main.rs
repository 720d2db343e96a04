use std::io;

use actix_identity::IdentityMiddleware;
use actix_session::{config::PersistentSession, storage::CookieSessionStore, SessionMiddleware};
use actix_web::{
    cookie::{time::Duration, Key},
    middleware, web, App, HttpServer,
};
use clap::{Parser, Subcommand};
use log::info;

use dashboard_auth::{resource, secret, shell, Authenticator, Config};

#[derive(Parser)]
#[command(name = "dashboard-auth", about = "Credential store for the data dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the register/login HTTP API (default)
    Serve,
    /// Register and log in from an interactive prompt
    Shell,
}

fn main() -> Result<(), failure::Error> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("dashboard_auth=info,actix_web=info"),
    )
    .init();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    let auth = Authenticator::from_config(&config)?;
    auth.initialize()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => actix_web::rt::System::new().block_on(serve(config, auth))?,
        Command::Shell => {
            let stdin = io::stdin();
            shell::run(&auth, stdin.lock(), io::stdout())?;
        }
    }

    Ok(())
}

async fn serve(config: Config, auth: Authenticator) -> Result<(), failure::Error> {
    let cookie_key = Key::try_from(&secret::cookie_key(&config.secrets_dir)?[..])
        .map_err(|e| failure::format_err!("{}: {}", secret::COOKIE_KEY, e))?;
    let auth = web::Data::new(auth);
    let domain = config.domain.clone();

    info!("Starting HTTP server on {}...", config.bind_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(auth.clone())
            .wrap(middleware::Logger::default())
            .wrap(IdentityMiddleware::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), cookie_key.clone())
                    .cookie_name("auth-cookie".to_string())
                    .cookie_path("/".to_string())
                    .cookie_domain(Some(domain.clone()))
                    .cookie_secure(false)
                    .session_lifecycle(PersistentSession::default().session_ttl(Duration::days(1)))
                    .build(),
            )
            .configure(resource::configure)
    })
    .bind(config.bind_addr.as_str())?
    .run()
    .await?;

    Ok(())
}
