use crate::config::AppSettings;
use crate::error::{AppError, AppResult};
use actix_files::NamedFile;
use actix_web::{web, HttpResponse, Responder};

const FAVICON_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
    <circle cx="50" cy="50" r="45" fill="#667eea"/>
    <text x="50" y="65" font-size="50" text-anchor="middle" fill="white">&#129302;</text>
</svg>"##;

pub async fn favicon() -> impl Responder {
    HttpResponse::Ok()
        .content_type("image/svg+xml")
        .body(FAVICON_SVG)
}

pub async fn serve_index(settings: web::Data<AppSettings>) -> AppResult<NamedFile> {
    let index_path = settings.static_files.dir.join("index.html");
    NamedFile::open_async(&index_path)
        .await
        .map_err(|_| AppError::NotFound("index.html is not available".to_string()))
}
