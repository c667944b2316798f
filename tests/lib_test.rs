//! Library integration tests.

use ec_provision::ProvisionError;

#[test]
fn error_types_are_public() {
    let err = ProvisionError::UnsupportedPlatform {
        message: "no package manager".into(),
    };
    assert!(err.to_string().contains("no package manager"));
    assert!(err.step().is_none());
}

#[test]
fn result_type_alias_is_public() {
    fn test_fn() -> ec_provision::Result<()> {
        Ok(())
    }
    assert!(test_fn().is_ok());
}

#[test]
fn cli_types_are_public() {
    use clap::Parser;
    use ec_provision::cli::{Cli, Commands};

    let cli = Cli::parse_from(["ec-provision", "check", "--json"]);

    if let Some(Commands::Check(args)) = cli.command {
        assert!(args.json);
    } else {
        panic!("Expected Check command");
    }
}

#[test]
fn step_tables_are_public() {
    use ec_provision::pipeline::{APT_STEPS, DNF_STEPS};

    assert_eq!(DNF_STEPS.len(), 14);
    assert_eq!(APT_STEPS.len(), 6);
    assert_eq!(DNF_STEPS[11].banner(), "[12/14] Building module");
}

#[test]
fn kernel_identity_derives_versions() {
    use ec_provision::kernel::KernelIdentity;

    let kernel = KernelIdentity::new("6.8.0-45-generic", "x86_64");
    assert_eq!(kernel.base_version(), "6.8.0");
    assert_eq!(kernel.release_suffix(), Some("45-generic"));
    assert_eq!(kernel.upstream_version(), "6.8");
}

#[test]
fn config_round_trips_through_yaml() {
    use ec_provision::config::ProvisionConfig;

    let yaml = "use_sudo: true\nmodule:\n  name: ec_sys\n";
    let config: ProvisionConfig = serde_yaml::from_str(yaml).unwrap();
    assert!(config.use_sudo);
    assert_eq!(config.paths.modules_root.to_str(), Some("/lib/modules"));
    assert!(config.validate().is_ok());
}
