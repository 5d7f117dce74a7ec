// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_listener_options`.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::vec::Vec;

use understory_listener_options::{
    EmulationState, HostEvent, Listener, ListenerOptionsAdapter, NativeTarget, OptionFields,
    OptionFlags, OptionsSource, SilentDiagnostics,
};

struct Ev {
    prevented: Cell<bool>,
    emulation: EmulationState,
}

impl Ev {
    fn new() -> Self {
        Self {
            prevented: Cell::new(false),
            emulation: EmulationState::new(),
        }
    }
}

impl HostEvent for Ev {
    fn event_type(&self) -> &str {
        "pointermove"
    }

    fn native_cancelable(&self) -> bool {
        true
    }

    fn native_prevent_default(&self) {
        self.prevented.set(true);
    }

    fn emulation(&self) -> &EmulationState {
        &self.emulation
    }
}

#[derive(Default)]
struct Target {
    listeners: RefCell<Vec<(Listener<Ev>, bool)>>,
}

impl NativeTarget<Ev> for Target {
    fn add_listener(&self, _: &str, listener: &Listener<Ev>, options: &dyn OptionsSource) {
        let capture = options.capture().unwrap_or(false);
        self.listeners.borrow_mut().push((listener.clone(), capture));
    }

    fn remove_listener(&self, _: &str, listener: &Listener<Ev>, capture: bool) {
        self.listeners
            .borrow_mut()
            .retain(|(l, c)| !(l.ptr_eq(listener) && *c == capture));
    }
}

impl Target {
    fn dispatch(&self, event: &Ev) {
        let snapshot: Vec<Listener<Ev>> =
            self.listeners.borrow().iter().map(|(l, _)| l.clone()).collect();
        for listener in snapshot {
            listener.invoke(event);
        }
    }
}

type Adapter = ListenerOptionsAdapter<Target, Ev>;

fn adapter(native: OptionFlags) -> Rc<Adapter> {
    Rc::new(
        Adapter::builder()
            .native_support(native)
            .diagnostics(SilentDiagnostics)
            .build(),
    )
}

fn listeners(adapter: &Rc<Adapter>, n: usize) -> Vec<Listener<Ev>> {
    (0..n)
        .map(|_| {
            let gate = Rc::downgrade(adapter);
            Listener::from_fn(move |e: &Ev| {
                if let Some(adapter) = gate.upgrade() {
                    black_box(adapter.prevent_default(e));
                }
            })
        })
        .collect()
}

fn bench_registration(c: &mut Criterion) {
    let mut group = c.benchmark_group("listener_options/registration");
    let options = OptionFields::new().with_passive(true).with_may_cancel(false);

    for &n in &[16_usize, 256] {
        group.bench_with_input(BenchmarkId::new("add_remove_emulated", n), &n, |b, &n| {
            let adapter = adapter(OptionFlags::empty());
            let list = listeners(&adapter, n);
            b.iter_batched(
                || Rc::new(Target::default()),
                |owner| {
                    for l in &list {
                        adapter.add_listener(&owner, "pointermove", l, options);
                    }
                    for l in &list {
                        adapter.remove_listener(&owner, "pointermove", l, options);
                    }
                    black_box(adapter.wrapper_count())
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("re_add_existing", n), &n, |b, &n| {
            let adapter = adapter(OptionFlags::empty());
            let list = listeners(&adapter, n);
            let owner = Rc::new(Target::default());
            for l in &list {
                adapter.add_listener(&owner, "pointermove", l, options);
            }
            b.iter(|| {
                for l in &list {
                    adapter.add_listener(&owner, "pointermove", l, options);
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("add_remove_native", n), &n, |b, &n| {
            let adapter = adapter(OptionFlags::all());
            let list = listeners(&adapter, n);
            b.iter_batched(
                || Rc::new(Target::default()),
                |owner| {
                    for l in &list {
                        adapter.add_listener(&owner, "pointermove", l, options);
                    }
                    for l in &list {
                        adapter.remove_listener(&owner, "pointermove", l, options);
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("listener_options/dispatch");
    let n = 64;

    for (name, native) in [
        ("emulated", OptionFlags::empty()),
        ("pass_through", OptionFlags::all()),
    ] {
        let adapter = adapter(native);
        let owner = Rc::new(Target::default());
        for l in &listeners(&adapter, n) {
            adapter.add_listener(
                &owner,
                "pointermove",
                l,
                OptionFields::new().with_passive(true),
            );
        }
        group.bench_function(name, |b| {
            b.iter(|| {
                let event = Ev::new();
                owner.dispatch(&event);
                black_box(event.prevented.get())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_registration, bench_dispatch);
criterion_main!(benches);
