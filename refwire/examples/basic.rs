//! Basic example of refwire field injection.
//!
//! Run with `RUST_LOG=refwire=trace` to watch the resolution.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use refwire::prelude::*;

// === Define your interfaces and components ===

trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

trait Database: Send + Sync {
    fn query(&self, sql: &str) -> String;
}

trait UserRepository: Send + Sync {
    fn find_user(&self, id: u64) -> String;
}

#[derive(Default, Injectable)]
struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

impl Component for ConsoleLogger {
    fn capabilities(caps: &mut Capabilities<Self>) {
        caps.provides::<dyn Logger>(|c| c);
    }
}

#[derive(Default, Injectable)]
struct Postgres {
    #[inject]
    logger: Inject<dyn Logger>,
    connections: AtomicUsize,
}

impl Database for Postgres {
    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from postgres ({} connection)", self.connections.load(Ordering::SeqCst))
    }
}

impl Component for Postgres {
    fn capabilities(caps: &mut Capabilities<Self>) {
        caps.provides::<dyn Database>(|c| c);
    }

    fn initialize(&self) -> std::result::Result<(), BoxError> {
        self.connections.fetch_add(1, Ordering::SeqCst);
        self.logger.log("Postgres pool opened");
        Ok(())
    }
}

#[derive(Default, Injectable)]
struct InMemory;

impl Database for InMemory {
    fn query(&self, _sql: &str) -> String {
        "Results from memory".to_string()
    }
}

impl Component for InMemory {
    fn capabilities(caps: &mut Capabilities<Self>) {
        caps.provides::<dyn Database>(|c| c);
    }
}

#[derive(Default, Injectable)]
struct SqlUserRepository {
    #[inject(labels = "primary")]
    db: Inject<dyn Database>,
}

impl UserRepository for SqlUserRepository {
    fn find_user(&self, id: u64) -> String {
        self.db.query(&format!("SELECT * FROM users WHERE id = {id}"))
    }
}

impl Component for SqlUserRepository {
    fn capabilities(caps: &mut Capabilities<Self>) {
        caps.provides::<dyn UserRepository>(|c| c);
    }
}

/// Not a component: an object whose fields get filled in place.
#[derive(Default, Injectable)]
struct UserService {
    #[inject]
    repo: Inject<dyn UserRepository>,
    #[inject]
    logger: Inject<dyn Logger>,
}

impl UserService {
    fn get_user(&self, id: u64) -> String {
        self.logger.log(&format!("Getting user {id}"));
        self.repo.find_user(id)
    }
}

fn main() -> Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "refwire=debug".into()),
        )
        .init();

    let mut registry = Registry::new();
    registry.register::<ConsoleLogger>(&[])?;
    registry.register::<Postgres>(&["primary", "sql"])?;
    registry.register::<InMemory>(&["test"])?;
    registry.register::<SqlUserRepository>(&[])?;
    registry.validate()?;

    println!("Registry validated: {} components", registry.len());

    // === Fill an existing object ===
    let service = UserService::default();
    registry.inject(&service)?;
    println!("{}", service.get_user(42));

    // === Build a component on demand ===
    let db: Arc<dyn Database> = registry.materialize(&["test"])?;
    println!("{}", db.query("SELECT 1"));

    // === Errors explain themselves ===
    if let Err(err) = registry.materialize::<dyn Database>(&[]) {
        println!("\n{err}");
    }

    Ok(())
}
