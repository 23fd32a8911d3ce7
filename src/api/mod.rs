use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::net::TcpListener;

use crate::core::{SipInputs, SipResult, SwpInputs, SwpResult, project_sip, project_swp};

mod error;
mod format;

pub use error::AppError;
pub use format::format_inr;

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

const DEFAULT_SIP_MONTHLY_INVESTMENT: f64 = 5_000.0;
const DEFAULT_SIP_ANNUAL_RETURN: f64 = 12.0;
const DEFAULT_SIP_YEARS: u32 = 10;
const DEFAULT_SIP_TAX_RATE: f64 = 10.0;

const DEFAULT_SWP_INITIAL_INVESTMENT: f64 = 1_000_000.0;
const DEFAULT_SWP_ANNUAL_RETURN: f64 = 8.0;
const DEFAULT_SWP_YEARS: u32 = 10;
const DEFAULT_SWP_MONTHLY_WITHDRAWAL: f64 = 10_000.0;

const MIN_SIP_MONTHLY_INVESTMENT: f64 = 500.0;
const MAX_ANNUAL_RETURN: f64 = 30.0;
const MAX_YEARS: u32 = 40;
const MAX_TAX_RATE: f64 = 40.0;

#[derive(Parser, Debug)]
#[command(
    name = "sipcalc",
    about = "SIP growth and SWP depletion projections with monthly compounding"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Project a systematic investment plan
    Sip(SipArgs),
    /// Project a systematic withdrawal plan
    Swp(SwpArgs),
    /// Serve the calculator UI and JSON API over HTTP
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
struct SipArgs {
    #[arg(
        long,
        default_value_t = DEFAULT_SIP_MONTHLY_INVESTMENT,
        help = "Monthly investment amount, at least 500"
    )]
    monthly_investment: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_SIP_ANNUAL_RETURN,
        help = "Expected annual return in percent, 1 to 30"
    )]
    annual_return: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_SIP_YEARS,
        help = "Investment tenure in years, 1 to 40"
    )]
    years: u32,
    #[arg(
        long,
        default_value_t = DEFAULT_SIP_TAX_RATE,
        help = "Tax rate on gains in percent, 0 to 40"
    )]
    tax_rate: f64,
    #[arg(long, help = "Print the JSON response body instead of a summary")]
    json: bool,
}

#[derive(Args, Debug, Clone)]
struct SwpArgs {
    #[arg(
        long,
        default_value_t = DEFAULT_SWP_INITIAL_INVESTMENT,
        help = "Lump sum invested at the start"
    )]
    initial_investment: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_SWP_ANNUAL_RETURN,
        help = "Expected annual return in percent, 0 to 30"
    )]
    annual_return: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_SWP_YEARS,
        help = "Withdrawal tenure in years, 1 to 40"
    )]
    years: u32,
    #[arg(
        long,
        default_value_t = DEFAULT_SWP_MONTHLY_WITHDRAWAL,
        help = "Fixed amount withdrawn every month"
    )]
    monthly_withdrawal: f64,
    #[arg(long, help = "Print the JSON response body instead of a summary")]
    json: bool,
}

#[derive(Args, Debug, Clone)]
struct ServeArgs {
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    host: IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SipPayload {
    monthly_investment: Option<f64>,
    annual_return: Option<f64>,
    years: Option<u32>,
    tax_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SwpPayload {
    initial_investment: Option<f64>,
    annual_return: Option<f64>,
    years: Option<u32>,
    monthly_withdrawal: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SipResponse {
    monthly_investment: f64,
    annual_return: f64,
    years: u32,
    tax_rate: f64,
    months: u32,
    #[serde(flatten)]
    result: SipResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SwpResponse {
    initial_investment: f64,
    annual_return: f64,
    years: u32,
    monthly_withdrawal: f64,
    months: u32,
    #[serde(flatten)]
    result: SwpResult,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Sip(args) => {
            let response = sip_response(&args)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print!("{}", render_sip_summary(&response));
            }
            Ok(())
        }
        Command::Swp(args) => {
            let response = swp_response(&args)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print!("{}", render_swp_summary(&response));
            }
            Ok(())
        }
        Command::Serve(args) => Ok(run_http_server(args.host, args.port).await?),
    }
}

fn build_sip_inputs(args: &SipArgs) -> Result<SipInputs, String> {
    if !args.monthly_investment.is_finite()
        || args.monthly_investment < MIN_SIP_MONTHLY_INVESTMENT
    {
        return Err(format!(
            "--monthly-investment must be at least {MIN_SIP_MONTHLY_INVESTMENT}"
        ));
    }

    if !(1.0..=MAX_ANNUAL_RETURN).contains(&args.annual_return) {
        return Err(format!(
            "--annual-return must be between 1 and {MAX_ANNUAL_RETURN}"
        ));
    }

    if !(1..=MAX_YEARS).contains(&args.years) {
        return Err(format!("--years must be between 1 and {MAX_YEARS}"));
    }

    if !(0.0..=MAX_TAX_RATE).contains(&args.tax_rate) {
        return Err(format!("--tax-rate must be between 0 and {MAX_TAX_RATE}"));
    }

    Ok(SipInputs {
        monthly_investment: args.monthly_investment,
        annual_return_percent: args.annual_return,
        years: args.years,
        tax_rate_percent: args.tax_rate,
    })
}

fn build_swp_inputs(args: &SwpArgs) -> Result<SwpInputs, String> {
    if !args.initial_investment.is_finite() || args.initial_investment <= 0.0 {
        return Err("--initial-investment must be > 0".to_string());
    }

    if !(0.0..=MAX_ANNUAL_RETURN).contains(&args.annual_return) {
        return Err(format!(
            "--annual-return must be between 0 and {MAX_ANNUAL_RETURN}"
        ));
    }

    if !(1..=MAX_YEARS).contains(&args.years) {
        return Err(format!("--years must be between 1 and {MAX_YEARS}"));
    }

    if !args.monthly_withdrawal.is_finite() || args.monthly_withdrawal <= 0.0 {
        return Err("--monthly-withdrawal must be > 0".to_string());
    }

    Ok(SwpInputs {
        initial_investment: args.initial_investment,
        annual_return_percent: args.annual_return,
        years: args.years,
        monthly_withdrawal: args.monthly_withdrawal,
    })
}

fn sip_response(args: &SipArgs) -> Result<SipResponse, AppError> {
    let inputs = build_sip_inputs(args).map_err(AppError::InvalidInput)?;
    log::debug!("projecting SIP: {inputs:?}");
    let result = project_sip(&inputs)?;

    Ok(SipResponse {
        monthly_investment: inputs.monthly_investment,
        annual_return: inputs.annual_return_percent,
        years: inputs.years,
        tax_rate: inputs.tax_rate_percent,
        months: inputs.years * 12,
        result,
    })
}

fn swp_response(args: &SwpArgs) -> Result<SwpResponse, AppError> {
    let inputs = build_swp_inputs(args).map_err(AppError::InvalidInput)?;
    log::debug!("projecting SWP: {inputs:?}");
    let result = project_swp(&inputs)?;

    Ok(SwpResponse {
        initial_investment: inputs.initial_investment,
        annual_return: inputs.annual_return_percent,
        years: inputs.years,
        monthly_withdrawal: inputs.monthly_withdrawal,
        months: inputs.years * 12,
        result,
    })
}

fn render_sip_summary(response: &SipResponse) -> String {
    let result = &response.result;
    format!(
        "SIP of {} per month for {} years at {}% expected return\n\
         Total investment: {}\n\
         Expected returns: {}\n\
         Tax amount:       {}\n\
         Final amount:     {}\n",
        format_inr(response.monthly_investment),
        response.years,
        response.annual_return,
        format_inr(result.total_investment),
        format_inr(result.returns),
        format_inr(result.tax_amount),
        format_inr(result.final_amount),
    )
}

fn render_swp_summary(response: &SwpResponse) -> String {
    let result = &response.result;
    format!(
        "SWP of {} per month from {} for {} years at {}% expected return\n\
         Total withdrawals: {}\n\
         Returns:           {}\n\
         Final balance:     {}\n",
        format_inr(response.monthly_withdrawal),
        format_inr(response.initial_investment),
        response.years,
        response.annual_return,
        format_inr(result.total_withdrawals),
        format_inr(result.returns),
        format_inr(result.final_balance),
    )
}

pub async fn run_http_server(host: IpAddr, port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::new(host, port);
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route("/api/sip", get(sip_get_handler).post(sip_post_handler))
        .route("/api/swp", get(swp_get_handler).post(swp_post_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    log::info!("listening on {addr}");
    println!("SIP/SWP calculator listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn sip_get_handler(payload: Result<Query<SipPayload>, QueryRejection>) -> Response {
    match payload {
        Ok(Query(payload)) => sip_handler_impl(payload).await,
        Err(rejection) => rejection_response("sip", &rejection.body_text()),
    }
}

async fn sip_post_handler(payload: Result<Json<SipPayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => sip_handler_impl(payload).await,
        Err(rejection) => rejection_response("sip", &rejection.body_text()),
    }
}

async fn swp_get_handler(payload: Result<Query<SwpPayload>, QueryRejection>) -> Response {
    match payload {
        Ok(Query(payload)) => swp_handler_impl(payload).await,
        Err(rejection) => rejection_response("swp", &rejection.body_text()),
    }
}

async fn swp_post_handler(payload: Result<Json<SwpPayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => swp_handler_impl(payload).await,
        Err(rejection) => rejection_response("swp", &rejection.body_text()),
    }
}

async fn sip_handler_impl(payload: SipPayload) -> Response {
    match sip_response(&sip_args_from_payload(payload)) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(e) => app_error_response("sip", e),
    }
}

async fn swp_handler_impl(payload: SwpPayload) -> Response {
    match swp_response(&swp_args_from_payload(payload)) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(e) => app_error_response("swp", e),
    }
}

// Extractor failures get the same JSON error body and headers as validation failures.
fn rejection_response(route: &str, msg: &str) -> Response {
    log::warn!("rejected {route} request: {msg}");
    error_response(StatusCode::BAD_REQUEST, msg)
}

fn app_error_response(route: &str, err: AppError) -> Response {
    match err {
        AppError::InvalidInput(msg) => {
            log::warn!("rejected {route} request: {msg}");
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
        AppError::Projection(e) => {
            log::warn!("rejected {route} request: {e}");
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
        other => {
            log::error!("{route} request failed: {other}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &other.to_string())
        }
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn sip_args_from_json(json: &str) -> Result<SipArgs, String> {
    let payload = serde_json::from_str::<SipPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    Ok(sip_args_from_payload(payload))
}

#[cfg(test)]
fn swp_args_from_json(json: &str) -> Result<SwpArgs, String> {
    let payload = serde_json::from_str::<SwpPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    Ok(swp_args_from_payload(payload))
}

fn sip_args_from_payload(payload: SipPayload) -> SipArgs {
    let mut args = default_sip_args();

    if let Some(v) = payload.monthly_investment {
        args.monthly_investment = v;
    }
    if let Some(v) = payload.annual_return {
        args.annual_return = v;
    }
    if let Some(v) = payload.years {
        args.years = v;
    }
    if let Some(v) = payload.tax_rate {
        args.tax_rate = v;
    }

    args
}

fn swp_args_from_payload(payload: SwpPayload) -> SwpArgs {
    let mut args = default_swp_args();

    if let Some(v) = payload.initial_investment {
        args.initial_investment = v;
    }
    if let Some(v) = payload.annual_return {
        args.annual_return = v;
    }
    if let Some(v) = payload.years {
        args.years = v;
    }
    if let Some(v) = payload.monthly_withdrawal {
        args.monthly_withdrawal = v;
    }

    args
}

fn default_sip_args() -> SipArgs {
    SipArgs {
        monthly_investment: DEFAULT_SIP_MONTHLY_INVESTMENT,
        annual_return: DEFAULT_SIP_ANNUAL_RETURN,
        years: DEFAULT_SIP_YEARS,
        tax_rate: DEFAULT_SIP_TAX_RATE,
        json: false,
    }
}

fn default_swp_args() -> SwpArgs {
    SwpArgs {
        initial_investment: DEFAULT_SWP_INITIAL_INVESTMENT,
        annual_return: DEFAULT_SWP_ANNUAL_RETURN,
        years: DEFAULT_SWP_YEARS,
        monthly_withdrawal: DEFAULT_SWP_MONTHLY_WITHDRAWAL,
        json: false,
    }
}
