#![cfg(feature = "derive")]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use wirebox::{Autowire, Constructible, Container, Entry, ErrorKind, Injectable, Overrides};

trait Mailer: Send + Sync {
    fn send(&self, to: &str) -> String;
}

struct Smtp;

impl Mailer for Smtp {
    fn send(&self, to: &str) -> String {
        format!("smtp:{to}")
    }
}

#[derive(Autowire)]
struct Config {
    #[autowire(default = "localhost".to_string())]
    host: String,
    #[autowire(default)]
    port: u16,
}

#[derive(Clone, PartialEq, Debug)]
struct Limits {
    burst: u32,
}

#[derive(Autowire)]
struct Signup {
    config: Arc<Config>,
    mailer: Arc<dyn Mailer>,
    #[autowire(default = 3)]
    retries: u32,
    // typed, cloned out of the `Limits` entry
    limits: Limits,
    #[autowire(skip)]
    sent: AtomicU64,
}

#[derive(Autowire)]
struct Marker;

#[derive(Autowire)]
struct Settings {
    #[autowire(default)]
    limit: Option<u32>,
    #[autowire(default)]
    tags: Vec<String>,
    #[autowire(default = std::time::Duration::from_secs(30))]
    timeout: std::time::Duration,
}

fn container() -> Container {
    let mailer: Arc<dyn Mailer> = Arc::new(Smtp);
    Container::builder()
        .register::<Config>()
        .register::<Signup>()
        .register::<Marker>()
        .entry(std::any::type_name::<dyn Mailer>(), Entry::value(mailer))
        .value(Limits::class_id(), Limits { burst: 10 })
        .build()
}

#[test]
fn test_parameter_table_follows_fields() {
    let names: Vec<String> = Signup::parameters()
        .iter()
        .map(|parameter| parameter.name().to_string())
        .collect();
    assert_eq!(names, ["config", "mailer", "retries", "limits"]);

    let parameters = Signup::parameters();
    assert_eq!(
        parameters[0].declared_type().map(|t| t.id()),
        Some(Config::class_id())
    );
    assert_eq!(
        parameters[1].declared_type().map(|t| t.id()),
        Some(std::any::type_name::<dyn Mailer>())
    );
    // primitives bind by name
    assert!(parameters[2].declared_type().is_none());
    assert!(parameters[2].is_optional());
    assert!(!parameters[0].is_optional());
}

#[test]
fn test_defaults_apply() {
    let config = container().resolve::<Config>().unwrap();
    assert_eq!(config.host, "localhost");
    assert_eq!(config.port, 0);
}

#[test]
fn test_autowire_graph() {
    let container = container();
    let signup = container.resolve::<Signup>().unwrap();

    assert!(Arc::ptr_eq(&signup.config, &container.resolve::<Config>().unwrap()));
    assert_eq!(signup.mailer.send("ada"), "smtp:ada");
    assert_eq!(signup.retries, 3);
    assert_eq!(signup.limits, Limits { burst: 10 });

    signup.sent.fetch_add(1, Ordering::SeqCst);
    assert_eq!(signup.sent.load(Ordering::SeqCst), 1);
}

#[test]
fn test_name_entries_and_overrides() {
    let container = container()
        .with("port", Entry::value(8080_u16))
        .with("retries", Entry::value(5_u32));

    let signup = container.resolve::<Signup>().unwrap();
    assert_eq!(signup.config.port, 8080);
    assert_eq!(signup.retries, 5);

    let config = container
        .make::<Config>(&Overrides::new().with("host", "db.internal".to_string()))
        .unwrap();
    assert_eq!(config.host, "db.internal");
    assert_eq!(config.port, 8080);
}

#[test]
fn test_missing_trait_implementation() {
    let container = Container::builder().register::<Signup>().register::<Config>().build();

    let err = container.resolve::<Signup>().err().unwrap();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_unit_struct() {
    assert!(Marker::parameters().is_empty());
    assert!(container().resolve::<Marker>().is_ok());
}

#[test]
fn test_optional_and_collection_fields_bind_by_name() {
    let container = Container::builder().register::<Settings>().build();

    let defaults = container.resolve::<Settings>().unwrap();
    assert_eq!(defaults.limit, None);
    assert!(defaults.tags.is_empty());
    assert_eq!(defaults.timeout, std::time::Duration::from_secs(30));

    let named = container
        .with("limit", Entry::value(Some(5_u32)))
        .with("tags", Entry::value(vec!["beta".to_string()]));
    let settings = named.make::<Settings>(&Overrides::new()).unwrap();
    assert_eq!(settings.limit, Some(5));
    assert_eq!(settings.tags, ["beta"]);

    assert!(
        Settings::parameters()
            .iter()
            .all(|parameter| parameter.declared_type().is_none())
    );
}
