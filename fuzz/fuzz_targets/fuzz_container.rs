#![no_main]

//! Fuzz target for container operations
//!
//! Builds random factory graphs over a small identifier space, cycles
//! included, and checks that resolution never panics or overflows the stack.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use wirebox::{Container, DiError, Entry, ErrorKind, Factory, Overrides, Value};

/// Identifiers are drawn from a small space so ops collide
fn key(slot: u8) -> String {
    format!("k{}", slot % 8)
}

#[derive(Debug, Arbitrary)]
enum ContainerOp {
    SetValue(u8, u32),
    SetNull(u8),
    /// Factory resolving another identifier
    SetForward(u8, u8),
    /// Factory that always fails
    SetFailing(u8),
    Get(u8),
    Has(u8),
    Create(u8, Option<u32>),
    With(u8, u32),
    Entries,
}

fuzz_target!(|ops: Vec<ContainerOp>| {
    let mut container = Container::new();

    for op in ops {
        match op {
            ContainerOp::SetValue(slot, value) => {
                container.set(key(slot), Entry::value(value));
                assert!(container.has(&key(slot)));
            }
            ContainerOp::SetNull(slot) => {
                container.set(key(slot), Entry::null());
                assert!(container.get(&key(slot)).is_ok_and(|v| v.is_null()));
            }
            ContainerOp::SetForward(slot, target) => {
                let target = key(target);
                container.set(
                    key(slot),
                    Factory::raw(Vec::new(), move |c, _| c.get(&target)),
                );
            }
            ContainerOp::SetFailing(slot) => {
                let id = key(slot);
                container.set(
                    key(slot),
                    Factory::raw(Vec::new(), move |_, _| {
                        Err(DiError::creation_failed(id.clone(), "fuzz"))
                    }),
                );
            }
            ContainerOp::Get(slot) => match container.get(&key(slot)) {
                Ok(first) => {
                    // singleton law
                    let second = container.get(&key(slot)).unwrap();
                    assert!(Value::ptr_eq(&first, &second));
                }
                Err(err) => assert!(matches!(
                    err.kind(),
                    ErrorKind::NotFound | ErrorKind::CircularReference | ErrorKind::CreationFailed
                )),
            },
            ContainerOp::Has(slot) => {
                let _ = container.has(&key(slot));
            }
            ContainerOp::Create(slot, value) => {
                let overrides = match value {
                    Some(value) => Overrides::new().with("value", value),
                    None => Overrides::new(),
                };
                let _ = container.create(&key(slot), &overrides);
            }
            ContainerOp::With(slot, value) => {
                let before = container.entries();
                let copy = container.with(key(slot), Entry::value(value));
                assert_eq!(container.entries(), before);
                assert!(copy.has(&key(slot)));
                container = copy;
            }
            ContainerOp::Entries => {
                let entries = container.entries();
                let mut deduped = entries.clone();
                deduped.dedup();
                assert_eq!(entries, deduped);
            }
        }
    }
});
