use once_cell::sync::Lazy;
use pricebook_common::config;
pub use slog::*;

fn wrap<D>(drain: D) -> Fuse<slog_async::Async>
where
    D: Drain<Err = Never, Ok = ()> + Send + 'static,
{
    slog_async::Async::new(slog_envlogger::new(drain))
        .chan_size(2 << 16)
        .thread_name("slog-async".into())
        .build()
        .fuse()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Json,
    Term,
}

impl LogFormat {
    fn from_config() -> Self {
        match config::get("RUST_LOG_FORMAT").unwrap_or_default().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Term,
        }
    }
}

pub static DEFAULT: Lazy<Logger> = Lazy::new(|| {
    let mk_term = || {
        slog_term::FullFormat::new(slog_term::TermDecorator::new().build())
            .build()
            .fuse()
    };

    let mk_json = || slog_json::Json::default(std::io::stdout()).fuse();

    // json 以外はすべて端末向けの整形出力
    let drain = match LogFormat::from_config() {
        LogFormat::Json => wrap(mk_json()),
        LogFormat::Term => wrap(mk_term()),
    };

    Logger::root(
        drain,
        o!(
            "service" => env!("CARGO_PKG_NAME"),
            "version" => env!("CARGO_PKG_VERSION"),
            "commit" => option_env!("GIT_COMMIT_HASH").unwrap_or("unknown"),
        ),
    )
});
