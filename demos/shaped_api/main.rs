//! Shaped API Example
//!
//! A small user service showing how a handler combines the two halves of the
//! framework:
//! - `ParsedQuery` taken straight from the request
//! - a shared `Presenter` deciding which attributes are rendered or accepted
//!
//! Try:
//!   curl 'http://127.0.0.1:3000/users?_include=name,email'
//!   curl 'http://127.0.0.1:3000/users?_exclude=email&role=admin'
//!   curl 'http://127.0.0.1:3000/users?name.like=a'
//!   curl -X POST -H 'content-type: application/json' \
//!        -d '{"id": 9, "name": "Eve", "role": "admin"}' http://127.0.0.1:3000/users

use std::sync::{Arc, RwLock};

use anyhow::Result;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use shape::prelude::*;
use tracing_subscriber::EnvFilter;

impl_model!(User {
    id: u64,
    name: String,
    email: String,
    role: String,
    password_hash: String,
});

const CONFIG: &str = r#"
presenters:
  - entity: user
    exclude:
      all: [password_hash]
      parse:
        all: [id, role]
    include:
      create: [role]
"#;

#[derive(Clone)]
struct AppState {
    users: Arc<RwLock<Vec<User>>>,
    presenter: Arc<Presenter>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "shape=debug".into()))
        .init();

    let config = ProjectionConfig::from_yaml_str(CONFIG)?;
    let registry = PresenterRegistry::from_config(&config, |entity| match entity {
        "user" => Some(User::attribute_names().iter().map(|s| s.to_string()).collect()),
        _ => None,
    })?;
    let presenter = registry
        .get("user")
        .ok_or_else(|| anyhow::anyhow!("missing presenter configuration for 'user'"))?;

    let state = AppState {
        users: Arc::new(RwLock::new(seed_users())),
        presenter,
    };

    let app = Router::new()
        .route("/users", get(list_users).post(create_user))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn list_users(State(state): State<AppState>, query: ParsedQuery) -> Response {
    if !query.is_valid() {
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(query.errors)).into_response();
    }

    let users = match state.users.read() {
        Ok(users) => users,
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    };

    let projection = state.presenter.resolve(Direction::Render, "list");
    let selected = query.select(projection.iter());

    let records: Vec<Record> = users
        .iter()
        .filter(|user| query.filters.iter().all(|filter| satisfies(user, filter)))
        .map(|user| {
            let mut record = state.presenter.render(user, "list");
            record.retain(|name, _| selected.contains(name));
            record
        })
        .collect();

    Json(records).into_response()
}

async fn create_user(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let accepted = match state.presenter.parse_value(&body, "create") {
        Ok(Projected::One(record)) => record,
        Ok(Projected::Many(_)) => {
            return (StatusCode::UNPROCESSABLE_ENTITY, "expected a single user").into_response();
        }
        Err(e) => {
            let e = ShapeError::from(e);
            return (e.status_code(), e.to_string()).into_response();
        }
    };

    let Ok(mut users) = state.users.write() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let user = User {
        id: users.len() as u64 + 1,
        name: string_field(&accepted, "name"),
        email: string_field(&accepted, "email"),
        role: string_field(&accepted, "role"),
        password_hash: String::new(),
    };
    let record = state.presenter.render(&user, "create");
    users.push(user);

    (StatusCode::CREATED, Json(record)).into_response()
}

/// Naive in-memory evaluation of a top-level filter
fn satisfies(user: &User, filter: &FilterPredicate) -> bool {
    if !filter.path.is_empty() {
        return true;
    }
    let Some(value) = user.attribute(&filter.name) else {
        return false;
    };
    let actual = match &value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    match filter.operation {
        OperatorKind::Eq => actual == filter.value,
        OperatorKind::Ne => actual != filter.value,
        OperatorKind::Like => actual.contains(&filter.value),
        OperatorKind::NotLike => !actual.contains(&filter.value),
        OperatorKind::Lt => actual < filter.value,
        OperatorKind::Gt => actual > filter.value,
        OperatorKind::Lte => actual <= filter.value,
        OperatorKind::Gte => actual >= filter.value,
    }
}

fn string_field(record: &Record, name: &str) -> String {
    record
        .get(name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn seed_users() -> Vec<User> {
    [
        ("Alice", "alice@example.com", "admin"),
        ("Bob", "bob@example.com", "member"),
        ("Carol", "carol@example.com", "member"),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (name, email, role))| User {
        id: i as u64 + 1,
        name: name.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        password_hash: "$argon2$...".to_string(),
    })
    .collect()
}
