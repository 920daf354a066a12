use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 終端機用的精簡格式
    Compact,
    /// 給日誌收集系統使用
    Json,
}

/// `RUST_LOG` 優先；否則使用 `level` (預設 info)
pub fn init_logger(level: Option<&str>, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Compact => registry.with(fmt_layer(false).compact()).init(),
        LogFormat::Json => registry.with(fmt_layer(true).json()).init(),
    }
}

fn fmt_layer<S>(with_target: bool) -> fmt::Layer<S> {
    fmt::layer()
        .with_target(with_target)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}

fn default_directive(level: Option<&str>) -> String {
    match level.map(str::trim).filter(|l| !l.is_empty()) {
        Some(level) => format!("lite_permissions={},info", level),
        None => "lite_permissions=info".to_string(),
    }
}
