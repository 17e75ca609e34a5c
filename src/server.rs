use crate::cmdline::Transport;
use crate::io_struct::{BatchReqInput, SingleReqInput};
use crate::renderer::{GatewayConfig, RenderError, RendererState};
use actix_web::{HttpRequest, HttpResponse, HttpServer, get, post, web};
use serde_json::json;
use std::io::Write;

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({
        "error": "Bad Request",
        "message": message,
    }))
}

fn internal_error(context: &str, err: &RenderError) -> HttpResponse {
    log::error!("Unexpected error in {}: {}", context, err);
    HttpResponse::InternalServerError().json(json!({
        "error": "Internal Server Error",
        "details": err.to_string(),
    }))
}

fn is_json(req: &HttpRequest) -> bool {
    req.headers()
        .get(actix_web::http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("application/json")
        })
        .unwrap_or(false)
}

#[get("/health")]
pub async fn health(_req: HttpRequest, app_state: web::Data<RendererState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "zint": app_state.zint_path.display().to_string(),
    }))
}

#[post("/generate_batch")]
pub async fn generate_batch(
    req: HttpRequest,
    body: web::Bytes,
    app_state: web::Data<RendererState>,
) -> HttpResponse {
    if !is_json(&req) {
        return HttpResponse::UnsupportedMediaType().json(json!({
            "error": "Unsupported Media Type",
            "message": "Content-Type must be application/json",
        }));
    }
    let input: BatchReqInput = match serde_json::from_slice(&body) {
        Ok(input) => input,
        Err(_) => return bad_request("Invalid JSON data. Expecting object with parameters"),
    };
    let items = match input.validated_items() {
        Ok(items) => items,
        Err(message) => return bad_request(message),
    };
    log::info!("Received batch request with {} items", items.len());

    match app_state.render_batch(&items, &input).await {
        Ok(archive) => HttpResponse::Ok()
            .content_type("application/zip")
            .insert_header((
                "Content-Disposition",
                "attachment; filename=\"barcodes.zip\"",
            ))
            .body(archive),
        Err(RenderError::Renderer { exit_code, detail }) => {
            HttpResponse::InternalServerError().json(json!({
                "error": "Barcode generation failed",
                "details": format!("Zint batch error ({exit_code}): {detail}"),
            }))
        }
        Err(err) => internal_error("generate_batch", &err),
    }
}

#[get("/generate")]
pub async fn generate_query(
    query: web::Query<Vec<(String, String)>>,
    app_state: web::Data<RendererState>,
) -> HttpResponse {
    let input = SingleReqInput::from_query(query.into_inner());
    generate_single(input, Transport::Query, &app_state).await
}

#[post("/generate")]
pub async fn generate_json(body: web::Bytes, app_state: web::Data<RendererState>) -> HttpResponse {
    let input: SingleReqInput = match serde_json::from_slice(&body) {
        Ok(input) => input,
        Err(_) => return bad_request("Invalid JSON data. Expecting object with parameters"),
    };
    generate_single(input, Transport::Json, &app_state).await
}

async fn generate_single(
    input: SingleReqInput,
    transport: Transport,
    app_state: &RendererState,
) -> HttpResponse {
    log::info!("Received generation request via {:?}", transport);
    match app_state.render_single(&input, transport).await {
        Ok((bytes, mime)) => HttpResponse::Ok().content_type(mime).body(bytes),
        // Single-item renderer failures answer 400, batch answers 500; kept
        // as-is for compatibility with existing callers.
        Err(RenderError::Renderer { exit_code, detail }) => {
            HttpResponse::BadRequest().json(json!({
                "error": "Barcode generation failed",
                "details": format!("Zint error ({exit_code}): {detail}"),
            }))
        }
        Err(err) => internal_error("generate", &err),
    }
}

pub async fn startup(config: GatewayConfig, state: RendererState) -> std::io::Result<()> {
    let app_state = web::Data::new(state);

    println!("Starting server at {}:{}", config.host, config.port);

    // default level is info
    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, log::LevelFilter::Info)
        .init();

    log::info!("Using Zint path: {}", app_state.zint_path.display());

    HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(app_state.clone())
            .service(health)
            .service(generate_batch)
            .service(generate_query)
            .service(generate_json)
    })
    .bind((config.host, config.port))?
    .run()
    .await?;

    std::io::Result::Ok(())
}
