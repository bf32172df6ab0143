use std::fs::File;

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Initializes the global logger.
///
/// The terminal front-end owns stdout and stderr, so records only go
/// somewhere when a `sink` file is supplied. `RUST_LOG` overrides the default
/// filter. When `verbose` is `true` debug records are kept.
pub fn init(verbose: bool, sink: Option<File>) {
    let level = match (&sink, verbose) {
        (None, _) => LevelFilter::Off,
        (Some(_), true) => LevelFilter::Debug,
        (Some(_), false) => LevelFilter::Info,
    };

    let env = Env::default().default_filter_or(level.to_string());
    let mut builder = Builder::from_env(env);
    if let Some(file) = sink {
        builder.target(Target::Pipe(Box::new(file)));
    }

    // `try_init` only fails if a logger was already set; tests call this
    // repeatedly.
    let _ = builder.try_init();
}
