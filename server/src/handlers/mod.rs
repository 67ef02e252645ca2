use std::path::Path;

use actix_files::Files;
use actix_web::web;

use crate::connection::ws_index;

pub fn root(cfg: &mut web::ServiceConfig, static_dir: &Path) {
    cfg.service(web::resource("/ws").route(web::get().to(ws_index)));

    // Registered last: it claims every remaining path.
    cfg.service(Files::new("/", static_dir).index_file("index.html"));
}
