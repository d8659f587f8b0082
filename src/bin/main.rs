use graft::{cli, config, telemetry};

fn main() {
    let cli = cli::parse_from(std::env::args_os());

    let _telemetry_guard = init_tracing(&cli);

    if let Err(e) = cli::run(cli) {
        tracing::error!("error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(cli: &cli::Cli) -> telemetry::TelemetryGuard {
    let mut cfg = match config::load_for_repo(Some(&cli.dst)) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("config load failed, using defaults: {err}");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };
    if let Some(raw) = &cli.log_format {
        match raw.parse() {
            Ok(format) => cfg.logging.stdout_format = format,
            Err(err) => eprintln!("invalid --log-format, ignoring: {err}"),
        }
    }
    let telemetry_cfg = telemetry::TelemetryConfig::new(cli.verbose, cfg.logging);
    telemetry::init(telemetry_cfg)
}
