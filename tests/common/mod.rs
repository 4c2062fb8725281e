#![allow(dead_code, unused_imports)]

pub use tether_test_utils::{
    builders, eventually, eventually_blocking, fake_process, fake_ui, harness, init_tracing,
    with_timeout,
};
