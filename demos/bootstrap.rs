//! Wiring a small application: values, a factory and autowired types
//!
//! Run with:
//!   cargo run --example bootstrap --features logging-pretty

use std::sync::Arc;
use wirebox::{Autowire, Container, Entry, Factory, Injectable, Overrides};

#[allow(dead_code)]
#[derive(Autowire)]
struct Greeting {
    name: String,
    #[autowire(default = true)]
    active: bool,
}

#[derive(Autowire)]
struct Greeter {
    #[autowire(default = "Hello".to_string())]
    salute: String,
    greeting: Arc<Greeting>,
}

impl Greeter {
    fn hello(&self) -> String {
        format!("{} {}", self.salute, self.greeting.name)
    }
}

fn main() -> wirebox::Result<()> {
    #[cfg(feature = "logging")]
    wirebox::logging::builder().wirebox_only().trace().compact().init();

    let container = Container::builder()
        .value("name", "Ada".to_string())
        .register::<Greeting>()
        .register::<Greeter>()
        .factory(
            "farewell",
            Factory::new(|c: &Container| {
                let greeting = c.resolve::<Greeting>()?;
                Ok(format!("Goodbye {}", greeting.name))
            }),
        )
        .build();

    // Autowired: Greeter -> Greeting -> "name"
    let greeter = container.resolve::<Greeter>()?;
    println!("{}", greeter.hello());
    println!("{}", container.get_as::<String>("farewell")?);

    // Fresh instance with an override, the cached one is untouched
    let formal =
        container.make::<Greeter>(&Overrides::new().with("salute", "Good day".to_string()))?;
    println!("{}", formal.hello());
    println!("{}", container.resolve::<Greeter>()?.hello());

    // A copy with a different name; resolved values are shared, fresh ones see the change
    let other = container.with("name", Entry::value("Rust".to_string()));
    println!("{}", other.resolve::<Greeter>()?.hello());
    println!("Hello {}", other.make::<Greeting>(&Overrides::new())?.name);

    println!("entries: {:?}", container.entries());
    println!("greeter id: {}", Greeter::class_id());

    Ok(())
}
