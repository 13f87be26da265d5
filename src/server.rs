// src/server.rs

use actix_cors::Cors;
use actix_files as fs;
use actix_web::{web, App, HttpServer};
use log::info;

use crate::api::{self, AppStateStruct};

// Running the Actix web server
pub async fn run_server(app_state: web::Data<AppStateStruct>) -> std::io::Result<()> {
    let bind = (app_state.config.bind.clone(), app_state.config.port);
    let frontend_dir = app_state.config.frontend_dir.clone();
    info!("Dashboard listening on http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(app_state.clone())
            .configure(api::configure)
            .service(fs::Files::new("/", frontend_dir.clone()).index_file("index.html")) // Serve frontend
    })
    .bind(bind)?
    .run()
    .await
}
