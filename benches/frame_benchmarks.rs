//! Performance benchmarks for the call path between host code and the engine.
//!
//! Measures frame packing on its own, engine method calls through a frame,
//! variant conversion and calls the engine dispatches into host methods.
//! The engine side is the in-process mock, so the numbers isolate the
//! bridge's own overhead.
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- --profile-time 5
//! ```

use std::ffi::c_void;
use std::hint::black_box;
use std::sync::Once;

use criterion::{Criterion, criterion_group, criterion_main};
use gdbridge::frame::CallFrame;
use gdbridge::prelude::*;
use gdbridge_mock::Arg;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

#[derive(ExtensionClass)]
#[bridge(base = Node, hooks)]
struct Accumulator {
    #[bridge(base)]
    base: Base<Node>,
    #[bridge(export)]
    total: i64,
}

impl Accumulator {
    fn add(&mut self, amount: i64) -> i64 {
        self.total += amount;
        self.total
    }
}

impl ClassHooks for Accumulator {
    fn register(builder: &mut ClassBuilder<Self>) {
        builder.method("add", Accumulator::add);
    }
}

struct BenchLibrary;

impl ExtensionLibrary for BenchLibrary {
    fn register_classes(registrar: &mut ClassRegistrar, level: InitLevel) {
        if level == InitLevel::Scene {
            registrar.register::<Accumulator>();
        }
    }
}

gdbridge::extension_entry!(bench_library_init, BenchLibrary);

fn load() {
    static LOAD: Once = Once::new();
    LOAD.call_once(|| {
        assert!(gdbridge_mock::load_library(bench_library_init));
        setup_profiler();
    });
}

fn frame_packing(c: &mut Criterion) {
    let position = Vector3::new(1.0, 2.0, 3.0);

    c.bench_function("frame_pack_scalars", |b| {
        b.iter(|| {
            let mut frame = CallFrame::new();
            frame.arg(black_box(&42i64)).unwrap();
            frame.arg(black_box(&0.5f64)).unwrap();
            frame.arg(black_box(&position)).unwrap();
            let _slot = frame.ret::<i64>().unwrap();
            black_box(frame.array(0));
        })
    });

    c.bench_function("frame_pack_full", |b| {
        b.iter(|| {
            let mut frame = CallFrame::new();
            for _ in 0..16 {
                frame.arg(black_box(&7i64)).unwrap();
            }
            black_box(frame.array(0));
        })
    });
}

fn engine_calls(c: &mut Criterion) {
    load();
    let node = Obj::<Node>::new_alloc().unwrap();

    c.bench_function("engine_call_int_return", |b| {
        b.iter(|| {
            black_box(node.get_child_count().unwrap());
            end_profiling_frame();
        })
    });

    c.bench_function("engine_call_string_name_return", |b| {
        b.iter(|| {
            black_box(node.get_name().unwrap());
            end_profiling_frame();
        })
    });

    node.free().unwrap();
}

fn variant_conversion(c: &mut Criterion) {
    load();

    c.bench_function("variant_int_round_trip", |b| {
        b.iter(|| {
            let variant = black_box(12i64).to_variant();
            black_box(i64::from_variant(&variant).unwrap());
        })
    });

    c.bench_function("variant_string_round_trip", |b| {
        let text = GString::from("accumulated héllo");
        b.iter(|| {
            let variant = black_box(&text).to_variant();
            black_box(GString::from_variant(&variant).unwrap());
        })
    });

    c.bench_function("variant_array_of_32", |b| {
        let values: Vec<i64> = (0..32).collect();
        b.iter(|| black_box(VariantArray::from_slice(black_box(&values)).unwrap()))
    });
}

fn host_dispatch(c: &mut Criterion) {
    load();
    let id = gdbridge_mock::construct("Accumulator").unwrap();

    c.bench_function("dispatch_variant_call", |b| {
        b.iter(|| black_box(gdbridge_mock::call_method(id, "add", &[Arg::Int(1)]).unwrap()))
    });

    c.bench_function("dispatch_ptrcall", |b| {
        let amount = 1i64;
        let args = [&amount as *const i64 as *const c_void];
        let mut ret = 0i64;
        b.iter(|| {
            gdbridge_mock::ptrcall_method(id, "add", &args, &mut ret as *mut i64 as *mut c_void);
            black_box(ret);
        })
    });

    c.bench_function("dispatch_property_get", |b| {
        b.iter(|| black_box(gdbridge_mock::get_property(id, "total")))
    });

    gdbridge_mock::destroy(id);
}

criterion_group!(benches, frame_packing, engine_calls, variant_conversion, host_dispatch);
criterion_main!(benches);
