//! Benchmarks for the container

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use wirebox::{
    Arguments, Constructible, Container, Entry, Factory, Injectable, Overrides, Parameter, Result,
};

#[allow(dead_code)]
struct Settings {
    url: String,
}

impl Constructible for Settings {
    fn parameters() -> Vec<Parameter> {
        vec![Parameter::typed::<String>("url").with_default("memory://".to_string())]
    }

    fn construct(args: &Arguments) -> Result<Self> {
        Ok(Self {
            url: args.cloned::<String>(0)?,
        })
    }
}

#[allow(dead_code)]
struct Repository {
    settings: Arc<Settings>,
}

impl Constructible for Repository {
    fn parameters() -> Vec<Parameter> {
        vec![Parameter::typed::<Settings>("settings")]
    }

    fn construct(args: &Arguments) -> Result<Self> {
        Ok(Self {
            settings: args.shared::<Settings>(0)?,
        })
    }
}

#[allow(dead_code)]
struct Handler {
    repository: Arc<Repository>,
    retries: u32,
}

impl Constructible for Handler {
    fn parameters() -> Vec<Parameter> {
        vec![
            Parameter::typed::<Repository>("repository"),
            Parameter::typed::<u32>("retries").with_default(3_u32),
        ]
    }

    fn construct(args: &Arguments) -> Result<Self> {
        Ok(Self {
            repository: args.shared::<Repository>(0)?,
            retries: args.cloned::<u32>(1)?,
        })
    }
}

fn wired() -> Container {
    Container::builder()
        .register::<Settings>()
        .register::<Repository>()
        .register::<Handler>()
        .build()
}

fn bench_registration(c: &mut Criterion) {
    let mut group = c.benchmark_group("registration");

    group.bench_function("build_values", |b| {
        b.iter(|| {
            let container = Container::builder()
                .value("name", "bench".to_string())
                .value("count", 5_i64)
                .build();
            black_box(container)
        })
    });

    group.bench_function("set_factory", |b| {
        let container = Container::new();
        b.iter(|| {
            container.set("answer", Factory::new(|_| Ok(42_u32)));
        })
    });

    group.bench_function("with_copy_10", |b| {
        let mut builder = Container::builder();
        for i in 0..10 {
            builder = builder.value(format!("entry{i}"), i);
        }
        let container = builder.build();

        b.iter(|| black_box(container.with("extra", Entry::null())))
    });

    group.finish();
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");
    group.throughput(Throughput::Elements(1));

    let container = wired();
    container.set("count", Entry::value(5_i64));
    container.set(
        "double",
        Factory::with_parameters(vec![Parameter::new("count")], |_, args| {
            Ok(args.cloned::<i64>(0)? * 2)
        }),
    );
    let _ = container.resolve::<Handler>().unwrap();
    let _ = container.get("double").unwrap();

    group.bench_function("get_value", |b| {
        b.iter(|| black_box(container.get("count").unwrap()))
    });

    group.bench_function("get_cached_factory", |b| {
        b.iter(|| black_box(container.get("double").unwrap()))
    });

    group.bench_function("get_cached_autowired", |b| {
        b.iter(|| black_box(container.get(Handler::class_id()).unwrap()))
    });

    group.bench_function("has_check", |b| {
        b.iter(|| black_box(container.has(Handler::class_id())))
    });

    group.bench_function("get_not_found", |b| {
        b.iter(|| black_box(container.get("missing").is_err()))
    });

    group.finish();
}

fn bench_autowiring(c: &mut Criterion) {
    let mut group = c.benchmark_group("autowiring");

    group.bench_function("first_resolve_graph_3", |b| {
        b.iter(|| {
            let container = wired();
            black_box(container.resolve::<Handler>().unwrap())
        })
    });

    group.bench_function("create_cached_plan", |b| {
        let container = wired();
        let overrides = Overrides::new().with("retries", 1_u32);

        b.iter(|| black_box(container.create(Handler::class_id(), &overrides).unwrap()))
    });

    group.finish();
}

fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("concurrent");

    group.bench_function("concurrent_reads_4", |b| {
        let container = wired();
        let _ = container.resolve::<Handler>().unwrap();

        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let c = container.clone();
                    thread::spawn(move || {
                        for _ in 0..100 {
                            let _ = c.resolve::<Handler>().unwrap();
                        }
                    })
                })
                .collect();

            for h in handles {
                h.join().unwrap();
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_registration,
    bench_resolution,
    bench_autowiring,
    bench_concurrent,
);

criterion_main!(benches);
