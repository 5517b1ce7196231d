use std::io::Write;

use serial_test::serial;

use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_apply_when_nothing_is_configured() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.to_string(), "127.0.0.1:3000");
    assert_eq!(settings.server.graceful_shutdown, Duration::from_secs(30));
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert!(settings.database.url.is_none());
    assert_eq!(settings.database.max_connections.get(), 8);
    assert_eq!(settings.cache.backend, CacheBackend::Memory);
    assert_eq!(settings.cache.namespace.as_str(), "tasklane:todo");
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn zero_values_are_rejected() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(0);
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "server.port",
            ..
        })
    ));

    let mut raw = RawSettings::default();
    raw.database.max_connections = Some(0);
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "database.max_connections",
            ..
        })
    ));
}

#[test]
fn unparsable_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("chatty".into());
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "logging.level",
            ..
        })
    ));
}

#[test]
fn redis_backend_requires_url() {
    let mut raw = RawSettings::default();
    raw.cache.backend = Some("redis".into());
    raw.cache.url = Some("   ".into());
    assert!(matches!(
        Settings::from_raw(raw.clone()),
        Err(LoadError::Invalid {
            key: "cache.url",
            ..
        })
    ));

    raw.cache.url = Some("redis://127.0.0.1/".into());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.cache.backend, CacheBackend::Redis);
    assert_eq!(settings.cache.url.as_deref(), Some("redis://127.0.0.1/"));
}

#[test]
fn malformed_cache_settings_are_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.backend = Some("memcache".into());
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "cache.backend",
            ..
        })
    ));

    let mut raw = RawSettings::default();
    raw.cache.namespace = Some("todo:".into());
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "cache.namespace",
            ..
        })
    ));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["tasklane"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "tasklane",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-url",
        "postgres://override",
        "--cache-backend",
        "redis",
        "--cache-url",
        "redis://cache:6379/",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.database_url.as_deref(),
                Some("postgres://override")
            );
            assert_eq!(serve.overrides.cache_backend, Some(CacheBackend::Redis));
            assert_eq!(
                serve.overrides.cache_url.as_deref(),
                Some("redis://cache:6379/")
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_migrate_arguments() {
    let args = CliArgs::parse_from([
        "tasklane",
        "migrate",
        "--database-url",
        "postgres://example",
    ]);

    match args.command.expect("migrate command") {
        Command::Migrate(migrate) => {
            assert_eq!(
                migrate.database.database_url.as_deref(),
                Some("postgres://example")
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
#[serial]
fn config_file_then_env_then_cli() {
    let mut file = tempfile::Builder::new()
        .prefix("tasklane-config-")
        .suffix(".toml")
        .tempfile()
        .expect("create config file");
    writeln!(
        file,
        "[server]\nport = 4100\n\n[cache]\nnamespace = \"file:todo\"\n\n[logging]\nlevel = \"warn\""
    )
    .expect("write config file");
    file.flush().expect("flush config file");

    // SAFETY: env mutation is confined to #[serial] tests.
    unsafe {
        std::env::set_var("TASKLANE__CACHE__NAMESPACE", "env:todo");
        std::env::set_var("TASKLANE__LOGGING__LEVEL", "error");
    }

    let path_arg = file.path().to_string_lossy().into_owned();
    let args = CliArgs::parse_from([
        "tasklane",
        "--config-file",
        path_arg.as_str(),
        "serve",
        "--log-level",
        "debug",
    ]);
    let result = load(&args);

    unsafe {
        std::env::remove_var("TASKLANE__CACHE__NAMESPACE");
        std::env::remove_var("TASKLANE__LOGGING__LEVEL");
    }

    let settings = result.expect("settings load");
    assert_eq!(settings.server.addr.port(), 4100);
    assert_eq!(settings.cache.namespace.as_str(), "env:todo");
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
#[serial]
fn missing_explicit_config_file_is_an_error() {
    let args = CliArgs::parse_from(["tasklane", "--config-file", "/nonexistent/tasklane.toml"]);
    assert!(matches!(load(&args), Err(LoadError::Build(_))));
}
