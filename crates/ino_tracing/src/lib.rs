use tracing_subscriber::filter::LevelFilter;

/// Init custom tracing_subscriber configuration with
/// the default level of WARN.
///
/// Output goes to stderr so stdout stays clean for the
/// program's own output.
#[ inline ]
pub fn init_tracing_subscriber() {
    init_tracing_subscriber_with( LevelFilter::WARN );
}

/// Like [`init_tracing_subscriber`], but with a custom default level.
/// `RUST_LOG` still takes precedence.
///
/// Calling it more than once keeps the first subscriber.
pub fn init_tracing_subscriber_with( default_level: LevelFilter ) {

    use tracing_subscriber::prelude::*;
    use tracing_subscriber::filter::EnvFilter;

    use tracing_subscriber::{
        fmt,
        registry
    };

    use std::io::IsTerminal;

    let output = std::io::stderr;

    let fmt_layer = fmt::layer()
        .with_writer( output )
        .with_ansi( output().is_terminal() )
    ;

    let env_layer = EnvFilter::builder()
        .with_default_directive( default_level.into() )
        .from_env_lossy()
    ;

    // Err only means a subscriber is already installed
    let _ = registry()
        .with( fmt_layer )
        .with( env_layer )
        .try_init();

}
