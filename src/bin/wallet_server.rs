use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use serde::Serialize;

use wallet_ledger::api::{
    is_server_error, ConfirmPaymentRequest, CreateWalletRequest, EntryView, PaymentConfirmData,
    PaymentHandler, RollbackData, RollbackRequest, WalletData, WalletQuery, WithdrawRequest,
};
use wallet_ledger::configure::load_config;
use wallet_ledger::gateway::PaymentGateway;
use wallet_ledger::logger::setup_logger;
use wallet_ledger::mocks::MockPaymentGateway;
use wallet_ledger::models::api_response::ApiResponse;
use wallet_ledger::models::CurrencyConverter;
use wallet_ledger::store::SledStore;
use wallet_ledger::wallet_ledger::WalletLedger;

#[derive(Parser, Debug)]
#[command(name = "wallet_server", about = "Wallet ledger HTTP service")]
struct Args {
    /// Override listen address from config
    #[arg(long)]
    listen_addr: Option<String>,

    /// Override data directory from config
    #[arg(long)]
    data_dir: Option<String>,
}

#[derive(Clone)]
struct AppState {
    payments: Arc<PaymentHandler<SledStore>>,
    query: Arc<WalletQuery<SledStore>>,
}

fn respond<T: Serialize>(resp: ApiResponse<T>) -> (StatusCode, Json<ApiResponse<T>>) {
    let status = if resp.is_success() {
        StatusCode::OK
    } else if is_server_error(&resp.code) {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(resp))
}

async fn confirm_payment(
    Extension(state): Extension<AppState>,
    Json(req): Json<ConfirmPaymentRequest>,
) -> (StatusCode, Json<ApiResponse<PaymentConfirmData>>) {
    respond(state.payments.handle_confirm(req).await)
}

async fn rollback_payment(
    Extension(state): Extension<AppState>,
    Json(req): Json<RollbackRequest>,
) -> (StatusCode, Json<ApiResponse<RollbackData>>) {
    respond(state.payments.handle_rollback(req).await)
}

async fn withdraw(
    Extension(state): Extension<AppState>,
    Json(req): Json<WithdrawRequest>,
) -> (StatusCode, Json<ApiResponse<PaymentConfirmData>>) {
    respond(state.payments.handle_withdraw(req).await)
}

async fn create_wallet(
    Extension(state): Extension<AppState>,
    Json(req): Json<CreateWalletRequest>,
) -> (StatusCode, Json<ApiResponse<WalletData>>) {
    respond(state.payments.handle_create_wallet(req).await)
}

async fn wallet_balance(
    Extension(state): Extension<AppState>,
    Path(user_id): Path<u64>,
) -> (StatusCode, Json<ApiResponse<WalletData>>) {
    respond(state.query.get_balance(user_id).await)
}

async fn wallet_transactions(
    Extension(state): Extension<AppState>,
    Path(user_id): Path<u64>,
) -> (StatusCode, Json<ApiResponse<Vec<EntryView>>>) {
    respond(state.query.get_transactions(user_id).await)
}

async fn health() -> Json<ApiResponse<String>> {
    Json(ApiResponse::success("Wallet server is healthy".to_string()))
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let mut config = load_config().expect("Failed to load config");
    if let Some(listen_addr) = args.listen_addr {
        config.listen_addr = listen_addr;
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }

    setup_logger(&config).expect("Failed to setup logger");

    let store = Arc::new(SledStore::open(&config.data_dir).expect("Failed to open wallet store"));
    let ledger = Arc::new(WalletLedger::new(store));
    let converter = CurrencyConverter::new(&config.currency, config.currency_decimals);

    if config.gateway.mode != "mock" {
        log::warn!(
            "gateway mode '{}' not available in this build, using mock",
            config.gateway.mode
        );
    }
    let gateway: Arc<dyn PaymentGateway> =
        Arc::new(MockPaymentGateway::new(config.gateway.auto_verify));

    let state = AppState {
        payments: Arc::new(PaymentHandler::new(
            ledger.clone(),
            gateway,
            converter.clone(),
        )),
        query: Arc::new(WalletQuery::new(ledger, converter)),
    };

    // Build router
    let app = Router::new()
        .route("/payments/confirm", post(confirm_payment))
        .route("/payments/rollback", post(rollback_payment))
        .route("/payments/withdraw", post(withdraw))
        .route("/wallet/create", post(create_wallet))
        .route("/wallet/:user_id/balance", get(wallet_balance))
        .route("/wallet/:user_id/transactions", get(wallet_transactions))
        .route("/health", get(health))
        .layer(Extension(state));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("Failed to bind listen address");

    println!("--------------------------------------------------");
    println!("Wallet Server Started");
    println!("  Listening on:      {}", config.listen_addr);
    println!("  Data dir:          {}", config.data_dir);
    println!("  Currency:          {} ({} decimals)", config.currency, config.currency_decimals);
    println!("--------------------------------------------------");
    println!("Endpoints:");
    println!("  POST /payments/confirm            - Verify payment, credit wallet");
    println!("  POST /payments/rollback           - Compensate a prior transaction");
    println!("  POST /payments/withdraw           - Check balance, debit wallet");
    println!("  POST /wallet/create               - Explicit wallet creation");
    println!("  GET  /wallet/:user_id/balance     - Current balance");
    println!("  GET  /wallet/:user_id/transactions- Entry history");
    println!("  GET  /health                      - Health check");
    println!("--------------------------------------------------");

    axum::serve(listener, app).await.unwrap();
}
