//! Shared test infrastructure.



/// Installs a tracing subscriber honouring `RUST_LOG`; repeated calls are harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
