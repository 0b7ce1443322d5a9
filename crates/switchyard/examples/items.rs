//! A small in-memory item store.
//!
//! ```text
//! cargo run -p switchyard --example items
//!
//! curl -X POST localhost:8080/items -d '{"name":"lamp"}'
//! curl localhost:8080/items/1
//! curl localhost:8080/static/css/site.css
//! ```
//!
//! Settings come from `switchyard.toml` when present and from
//! `SWITCHYARD__*` environment variables.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use http::StatusCode;
use serde::{Deserialize, Serialize};
use switchyard::prelude::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Item {
    #[serde(default)]
    id: u64,
    name: String,
}

#[derive(Debug, Default)]
struct Store {
    next_id: u64,
    items: BTreeMap<u64, Item>,
}

type SharedStore = Arc<Mutex<Store>>;

fn routes(store: &SharedStore) -> Dispatcher {
    let mut app = Dispatcher::new();

    app.use_middleware(RequestIdMiddleware::trust_incoming())
        .use_middleware(AccessLogMiddleware::new())
        .use_middleware(FnMiddleware::new(
            "json_only",
            |ex: &mut Exchange, _: &mut Context| -> anyhow::Result<()> {
                if ex.body().is_empty() {
                    return Ok(());
                }
                match ex.headers().get(http::header::CONTENT_TYPE) {
                    Some(v) if v == "application/json" => Ok(()),
                    _ => anyhow::bail!("request body must be application/json"),
                }
            },
        ));

    let list = Arc::clone(store);
    app.get("/items", move |ex: &mut Exchange, _: &mut Context| {
        let items: Vec<Item> = match list.lock() {
            Ok(store) => store.items.values().cloned().collect(),
            Err(_) => return ex.write_header(StatusCode::INTERNAL_SERVER_ERROR),
        };
        if ex.write_json(&items).is_err() {
            ex.write_header(StatusCode::INTERNAL_SERVER_ERROR);
        }
    });

    let fetch = Arc::clone(store);
    app.get("/items/:id", move |ex: &mut Exchange, ctx: &mut Context| {
        let Ok(id) = ctx.param("id").parse::<u64>() else {
            ex.write_header(StatusCode::BAD_REQUEST);
            ex.write("id must be a number");
            return;
        };

        let found = fetch.lock().ok().and_then(|s| s.items.get(&id).cloned());
        match found {
            Some(item) => {
                let _ = ex.write_json(&item);
            }
            None => ex.write_header(StatusCode::NOT_FOUND),
        }
    });

    let create = Arc::clone(store);
    app.post("/items", move |ex: &mut Exchange, _: &mut Context| {
        let mut item: Item = match serde_json::from_slice(ex.body()) {
            Ok(item) => item,
            Err(e) => {
                ex.write_header(StatusCode::BAD_REQUEST);
                ex.write(e.to_string());
                return;
            }
        };

        let Ok(mut store) = create.lock() else {
            ex.write_header(StatusCode::INTERNAL_SERVER_ERROR);
            return;
        };
        store.next_id += 1;
        item.id = store.next_id;
        store.items.insert(item.id, item.clone());
        drop(store);

        ex.write_header(StatusCode::CREATED);
        let _ = ex.write_json(&item);
    });

    app.handle_service(http::Method::GET, "/static/*path", |ex: &mut Exchange| {
        let path = ex.path().trim_start_matches("/static/").to_string();
        ex.write(format!("would serve {path}"));
    });

    app.handle_any("/health", context_free(|ex: &mut Exchange| {
        ex.write("ok");
    }));

    app.not_found(|ex: &mut Exchange, ctx: &mut Context| {
        let body = serde_json::json!({
            "error": "not_found",
            "path": ex.path(),
            "request_id": ctx.request_id().to_string(),
        });
        ex.write_header(StatusCode::NOT_FOUND);
        let _ = ex.write_json(&body);
    });

    app
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::new()
        .with_development()
        .with_optional_file("switchyard.toml")?
        .with_env_prefix("SWITCHYARD")
        .load()?;

    init_telemetry(&config.telemetry_config()?)?;

    let store = SharedStore::default();
    let server = Server::bind(config.server_config(), routes(&store)).await?;
    tracing::info!(addr = %server.local_addr(), "items example ready");

    server.run().await?;
    Ok(())
}
