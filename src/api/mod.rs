use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::core::{
    COUNTRIES, ComparisonResult, Currency, Inputs, REFERENCE_BRACKETS, ReferencePoint,
    find_country, format_currency, run_comparison, top_percent,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

const MAX_SIMULATED_DELAY_MS: u64 = 10_000;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliCurrency {
    Inr,
    Usd,
    Gbp,
    Eur,
    Jpy,
    Aud,
}

impl From<CliCurrency> for Currency {
    fn from(value: CliCurrency) -> Self {
        match value {
            CliCurrency::Inr => Currency::Inr,
            CliCurrency::Usd => Currency::Usd,
            CliCurrency::Gbp => Currency::Gbp,
            CliCurrency::Eur => Currency::Eur,
            CliCurrency::Jpy => Currency::Jpy,
            CliCurrency::Aud => Currency::Aud,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
enum ApiCurrency {
    #[serde(alias = "inr")]
    Inr,
    #[serde(alias = "usd")]
    Usd,
    #[serde(alias = "gbp")]
    Gbp,
    #[serde(alias = "eur")]
    Eur,
    #[serde(alias = "jpy")]
    Jpy,
    #[serde(alias = "aud")]
    Aud,
}

impl From<ApiCurrency> for CliCurrency {
    fn from(value: ApiCurrency) -> Self {
        match value {
            ApiCurrency::Inr => CliCurrency::Inr,
            ApiCurrency::Usd => CliCurrency::Usd,
            ApiCurrency::Gbp => CliCurrency::Gbp,
            ApiCurrency::Eur => CliCurrency::Eur,
            ApiCurrency::Jpy => CliCurrency::Jpy,
            ApiCurrency::Aud => CliCurrency::Aud,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ComparePayload {
    country: Option<String>,
    #[serde(alias = "income")]
    annual_income: Option<f64>,
    currency: Option<ApiCurrency>,
    simulated_delay_ms: Option<u64>,
}

#[derive(Parser, Debug)]
#[command(
    name = "incomeindex",
    about = "Income percentile comparison service over a fixed six-bracket reference distribution"
)]
struct Cli {
    #[arg(long, help = "Country code from the fixed list, e.g. US or IND")]
    country: Option<String>,
    #[arg(long, default_value_t = 0.0, help = "Annual income to place, pre-tax")]
    annual_income: f64,
    #[arg(
        long,
        value_enum,
        help = "Display currency; defaults to the selected country's currency"
    )]
    currency: Option<CliCurrency>,
    #[arg(
        long,
        default_value_t = 0,
        help = "Artificial response delay in milliseconds, standing in for a slow upstream"
    )]
    simulated_delay_ms: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    country: String,
    country_name: String,
    currency: String,
    user_income: f64,
    user_percentile: u32,
    top_percent: u32,
    formatted_income: String,
    reference_data: Vec<ReferencePoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CountryResponse {
    name: &'static str,
    code: &'static str,
    currency: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: Cli) -> Result<Inputs, String> {
    let Some(code) = cli
        .country
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
    else {
        return Err("Please select a country.".to_string());
    };

    let Some(country) = find_country(code) else {
        return Err(format!("Unknown country code: {code}"));
    };

    if !cli.annual_income.is_finite() {
        return Err("--annual-income must be a finite number".to_string());
    }

    if cli.annual_income < 0.0 {
        return Err("--annual-income must be >= 0".to_string());
    }

    if cli.simulated_delay_ms > MAX_SIMULATED_DELAY_MS {
        return Err(format!(
            "--simulated-delay-ms must be <= {MAX_SIMULATED_DELAY_MS}"
        ));
    }

    Ok(Inputs {
        country,
        annual_income: cli.annual_income,
        display_currency: cli
            .currency
            .map(Currency::from)
            .unwrap_or(country.currency),
        simulated_delay_ms: cli.simulated_delay_ms,
    })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route("/api/countries", get(countries_handler))
        .route(
            "/api/compare",
            get(compare_get_handler).post(compare_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("IncomeIndex HTTP API listening on http://{addr}");
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

async fn countries_handler() -> Response {
    json_response(StatusCode::OK, country_list())
}

async fn compare_get_handler(Query(payload): Query<ComparePayload>) -> Response {
    compare_handler_impl(payload).await
}

async fn compare_post_handler(Json(payload): Json<ComparePayload>) -> Response {
    compare_handler_impl(payload).await
}

async fn compare_handler_impl(payload: ComparePayload) -> Response {
    let inputs = match inputs_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    if inputs.simulated_delay_ms > 0 {
        // If the client goes away while this sleeps, axum drops the handler
        // future and the result is discarded with it.
        tokio::time::sleep(Duration::from_millis(inputs.simulated_delay_ms)).await;
    }

    let result = run_comparison(&REFERENCE_BRACKETS, inputs.annual_income);
    let response = build_compare_response(&inputs, &result);
    json_response(StatusCode::OK, response)
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn country_list() -> Vec<CountryResponse> {
    COUNTRIES
        .iter()
        .map(|country| CountryResponse {
            name: country.name,
            code: country.code,
            currency: country.currency.code(),
        })
        .collect()
}

#[cfg(test)]
fn inputs_from_json(json: &str) -> Result<Inputs, String> {
    let payload = serde_json::from_str::<ComparePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    inputs_from_payload(payload)
}

fn inputs_from_payload(payload: ComparePayload) -> Result<Inputs, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.country {
        cli.country = Some(v);
    }
    if let Some(v) = payload.annual_income {
        cli.annual_income = v;
    }
    if let Some(v) = payload.currency {
        cli.currency = Some(v.into());
    }
    if let Some(v) = payload.simulated_delay_ms {
        cli.simulated_delay_ms = v;
    }

    build_inputs(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        country: None,
        annual_income: 0.0,
        currency: None,
        simulated_delay_ms: 0,
    }
}

fn build_compare_response(inputs: &Inputs, result: &ComparisonResult) -> CompareResponse {
    CompareResponse {
        country: inputs.country.code.to_string(),
        country_name: inputs.country.name.to_string(),
        currency: inputs.display_currency.code().to_string(),
        user_income: result.user_income,
        user_percentile: result.user_percentile,
        top_percent: top_percent(result.user_percentile),
        formatted_income: format_currency(result.user_income, inputs.display_currency),
        reference_data: result.reference_data.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_golden_snapshot(path: &str, actual: &str) {
        let update = matches!(
            std::env::var("UPDATE_GOLDEN").as_deref(),
            Ok("1") | Ok("true") | Ok("TRUE")
        );
        let snapshot_path = Path::new(path);

        if update {
            if let Some(parent) = snapshot_path.parent() {
                fs::create_dir_all(parent).expect("failed to create snapshot directory");
            }
            fs::write(snapshot_path, actual).expect("failed to write golden snapshot");
            return;
        }

        let expected = fs::read_to_string(snapshot_path).unwrap_or_else(|_| {
            panic!("missing golden snapshot at {path}; run with UPDATE_GOLDEN=1 to generate")
        });
        assert_eq!(
            actual, expected,
            "snapshot mismatch for {path}; run with UPDATE_GOLDEN=1 to refresh if expected"
        );
    }

    #[test]
    fn build_inputs_rejects_missing_country() {
        let err = build_inputs(default_cli_for_api()).expect_err("must require a country");
        assert_eq!(err, "Please select a country.");
    }

    #[test]
    fn build_inputs_rejects_blank_country() {
        let mut cli = default_cli_for_api();
        cli.country = Some("   ".to_string());
        let err = build_inputs(cli).expect_err("must reject a blank country");
        assert_eq!(err, "Please select a country.");
    }

    #[test]
    fn build_inputs_rejects_unknown_country() {
        let mut cli = default_cli_for_api();
        cli.country = Some("FR".to_string());
        let err = build_inputs(cli).expect_err("must reject unlisted codes");
        assert!(err.contains("Unknown country code"));
    }

    #[test]
    fn build_inputs_rejects_non_finite_income() {
        let mut cli = default_cli_for_api();
        cli.country = Some("US".to_string());
        cli.annual_income = f64::NAN;
        let err = build_inputs(cli).expect_err("must reject NaN income");
        assert!(err.contains("--annual-income"));

        let mut cli = default_cli_for_api();
        cli.country = Some("US".to_string());
        cli.annual_income = f64::INFINITY;
        let err = build_inputs(cli).expect_err("must reject infinite income");
        assert!(err.contains("--annual-income"));
    }

    #[test]
    fn build_inputs_rejects_negative_income() {
        let mut cli = default_cli_for_api();
        cli.country = Some("US".to_string());
        cli.annual_income = -1.0;
        let err = build_inputs(cli).expect_err("must reject negative income");
        assert!(err.contains("--annual-income"));
    }

    #[test]
    fn build_inputs_rejects_oversized_delay() {
        let mut cli = default_cli_for_api();
        cli.country = Some("US".to_string());
        cli.simulated_delay_ms = MAX_SIMULATED_DELAY_MS + 1;
        let err = build_inputs(cli).expect_err("must bound the simulated delay");
        assert!(err.contains("--simulated-delay-ms"));
    }

    #[test]
    fn build_inputs_defaults_currency_to_selected_country() {
        let mut cli = default_cli_for_api();
        cli.country = Some("IND".to_string());
        cli.annual_income = 5_000.0;

        let inputs = build_inputs(cli).expect("valid inputs");
        assert_eq!(inputs.display_currency, Currency::Inr);
        assert_eq!(inputs.country.name, "INDIA");
    }

    #[test]
    fn inputs_from_json_parses_web_keys_and_currency_override() {
        let json = r#"{
          "country": "US",
          "annualIncome": 30000,
          "currency": "GBP",
          "simulatedDelayMs": 250
        }"#;
        let inputs = inputs_from_json(json).expect("json should parse");

        assert_eq!(inputs.country.code, "US");
        assert_approx(inputs.annual_income, 30_000.0);
        assert_eq!(inputs.display_currency, Currency::Gbp);
        assert_eq!(inputs.simulated_delay_ms, 250);
    }

    #[test]
    fn inputs_from_json_accepts_income_alias() {
        let json = r#"{"country": "JP", "income": 12000}"#;
        let inputs = inputs_from_json(json).expect("json should parse");
        assert_approx(inputs.annual_income, 12_000.0);
        assert_eq!(inputs.display_currency, Currency::Jpy);
    }

    #[test]
    fn inputs_from_json_reports_missing_country_with_exact_message() {
        let err = inputs_from_json(r#"{"annualIncome": 30000}"#)
            .expect_err("must require a country before computing anything");
        assert_eq!(err, "Please select a country.");
    }

    #[test]
    fn compare_response_serialization_contains_expected_fields() {
        let inputs = inputs_from_json(r#"{"country": "IND", "annualIncome": 5000}"#)
            .expect("valid inputs");
        let result = run_comparison(&REFERENCE_BRACKETS, inputs.annual_income);
        let response = build_compare_response(&inputs, &result);
        let json = serde_json::to_string(&response).expect("response should serialize");

        assert!(json.contains("\"country\":\"IND\""));
        assert!(json.contains("\"countryName\":\"INDIA\""));
        assert!(json.contains("\"currency\":\"INR\""));
        assert!(json.contains("\"userPercentile\":10"));
        assert!(json.contains("\"topPercent\":90"));
        assert!(json.contains("\"referenceData\""));
        assert!(json.contains("\"formattedIncome\""));
    }

    #[test]
    fn top_percent_in_response_is_complement_of_percentile() {
        for income in [0.0, 5_000.0, 30_000.0, 75_000.0, 150_000.0, 500_000.0] {
            let json = format!("{{\"country\": \"DE\", \"annualIncome\": {income}}}");
            let inputs = inputs_from_json(&json).expect("valid inputs");
            let result = run_comparison(&REFERENCE_BRACKETS, inputs.annual_income);
            let response = build_compare_response(&inputs, &result);
            assert_eq!(response.top_percent, 100 - response.user_percentile);
        }
    }

    #[test]
    fn country_list_matches_the_fixed_table() {
        let list = country_list();
        assert_eq!(list.len(), 6);
        let json = serde_json::to_string(&list).expect("country list should serialize");
        assert!(json.contains("\"code\":\"IND\""));
        assert!(json.contains("\"code\":\"AU\""));
        assert!(json.contains("\"currency\":\"EUR\""));
        assert!(json.contains("\"name\":\"United Kingdom\""));
    }

    #[test]
    fn golden_snapshot_compare_us_30000_json() {
        let inputs = inputs_from_json(r#"{"country": "US", "annualIncome": 30000}"#)
            .expect("valid inputs");
        let result = run_comparison(&REFERENCE_BRACKETS, inputs.annual_income);
        let response = build_compare_response(&inputs, &result);
        let json = format!(
            "{}\n",
            serde_json::to_string(&response).expect("response should serialize")
        );

        assert_golden_snapshot("tests/golden/compare_us_30000.json", &json);
    }
}
