//! Shared wasmtime harness for executing compiled programs in tests.

use std::collections::VecDeque;
use wasmtime::{Caller, Engine, Instance, Linker, Module, Store};

pub struct Host {
    pub printed: Vec<i32>,
    pub inputs: VecDeque<i32>,
    pub reads: usize,
}

impl Host {
    fn new(inputs: &[i32]) -> Self {
        Host {
            printed: Vec::new(),
            inputs: inputs.iter().copied().collect(),
            reads: 0,
        }
    }
}

fn instantiate(wasm: &[u8], inputs: &[i32]) -> (Store<Host>, Instance) {
    let engine = Engine::default();
    let module = Module::new(&engine, wasm).expect("generated module should load");

    let mut linker: Linker<Host> = Linker::new(&engine);
    linker
        .func_wrap(
            "stdlib",
            "print",
            |mut caller: Caller<'_, Host>, value: i32| {
                caller.data_mut().printed.push(value);
            },
        )
        .expect("print import should register");
    linker
        .func_wrap("stdlib", "read", |mut caller: Caller<'_, Host>| -> i32 {
            let host = caller.data_mut();
            host.reads += 1;
            host.inputs.pop_front().unwrap_or(0)
        })
        .expect("read import should register");

    let mut store = Store::new(&engine, Host::new(inputs));
    let instance = linker
        .instantiate(&mut store, &module)
        .expect("instantiation should succeed");

    (store, instance)
}

/// Runs a structured-strategy module to completion and returns the host state.
pub fn run_structured(wasm: &[u8], inputs: &[i32]) -> Host {
    let (mut store, instance) = instantiate(wasm, inputs);

    let main = instance
        .get_typed_func::<(), ()>(&mut store, "main")
        .expect("main export");
    main.call(&mut store, ()).expect("main should run");

    store.into_data()
}

pub struct ResumableRun {
    pub printed: Vec<i32>,
    /// How many times the entry point ran before the finished sentinel
    pub invocations: usize,
}

/// Drives a resumable-strategy module through the full suspension
/// protocol: call main, deposit an input, reinvoke with the returned
/// label, until the finished sentinel comes back.
pub fn run_resumable(wasm: &[u8], inputs: &[i32]) -> ResumableRun {
    let (mut store, instance) = instantiate(wasm, inputs);

    let main = instance
        .get_typed_func::<i32, i32>(&mut store, "main")
        .expect("main export");
    let set_read_value = instance
        .get_typed_func::<i32, ()>(&mut store, "set_read_value")
        .expect("set_read_value export");

    let mut label = main.call(&mut store, 0).expect("main should run");
    let mut invocations = 1;

    while label >= 0 {
        assert!(invocations < 10_000, "resumable program never finished");

        let value = store.data_mut().inputs.pop_front().unwrap_or(0);

        set_read_value
            .call(&mut store, value)
            .expect("set_read_value should run");
        label = main.call(&mut store, label).expect("main should resume");
        invocations += 1;
    }

    assert_eq!(label, -1, "finished sentinel should be -1");

    ResumableRun {
        printed: store.into_data().printed,
        invocations,
    }
}
