use clap::Parser;
use mcq_admin::{
    auth::BasicAuth,
    names,
    store::{GoogleSheets, MemorySheet, SheetBackend, SheetsCredentials},
    AppState,
};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Service account email used to sign Sheets API tokens.
    #[arg(long, env = "GOOGLE_SERVICE_ACCOUNT_EMAIL")]
    service_account_email: Option<String>,

    /// PEM private key of the service account; `\n` escapes are expanded.
    #[arg(long, env = "GOOGLE_PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    /// Spreadsheet holding the questions.
    #[arg(long, env = "GOOGLE_SHEET_ID")]
    sheet_id: Option<String>,

    /// Basic auth username. The gate is on only when a password is set too.
    #[arg(long, env = "BASIC_AUTH_USER")]
    basic_auth_user: Option<String>,

    /// Basic auth password.
    #[arg(long, env = "BASIC_AUTH_PASSWORD", hide_env_values = true)]
    basic_auth_password: Option<String>,

    /// The address to bind to.
    #[arg(short, long, env, default_value = names::DEFAULT_ADDRESS)]
    address: String,

    /// Serve from an in-process sheet instead of Google Sheets.
    #[arg(long)]
    in_memory: bool,
}

async fn serve<B: SheetBackend + 'static>(
    state: AppState<B>,
    address: std::net::SocketAddr,
) -> color_eyre::Result<()> {
    if let Err(e) = state.store.init().await {
        tracing::warn!("sheet metadata not available yet, will retry on first request: {e}");
    }

    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, mcq_admin::router(state)).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| names::DEFAULT_LOG_FILTER.to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .init();

    let args = Args::parse();
    let address = args.address.parse::<std::net::SocketAddr>()?;
    let basic_auth = BasicAuth::from_parts(args.basic_auth_user, args.basic_auth_password);

    if args.in_memory {
        tracing::info!("serving from an in-memory sheet, data is lost on exit");
        return serve(AppState::new(MemorySheet::default(), basic_auth), address).await;
    }

    let credentials =
        SheetsCredentials::from_parts(args.service_account_email, args.private_key, args.sheet_id);
    serve(AppState::new(GoogleSheets::new(credentials), basic_auth), address).await
}
