use super::*;

fn parse(extra: &[&str]) -> CliConfig {
    let mut args = vec![
        "trigger-relay",
        "--jenkins-url=http://localhost:8081/",
        "--jenkins-token=whatever",
    ];
    args.extend_from_slice(extra);
    CliConfig::try_parse_from(args).unwrap()
}

#[test]
fn test_defaults() {
    let config = parse(&[]);

    assert_eq!(config.quiet_period(), Duration::from_secs(10));
    assert_eq!(config.refresh_interval(), Duration::from_secs(60));
    assert_eq!(config.mapping_file, PathBuf::from("mapping.csv"));
    assert_eq!(config.listen, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
    assert!(!config.file_matching);
    assert!(config.validate().is_ok());
}

#[test]
fn test_flags_are_parsed() {
    let config = parse(&[
        "--mapping-url=http://localhost:8083/example.csv",
        "--quiet-period=1",
        "--file-matching",
        "--semantic-repo=git://repo/magic/",
        "--jenkins-folder=multi",
        "--jenkins-user=ci",
        "--listen=127.0.0.1:9090",
        "--log-format=pretty",
    ]);

    assert_eq!(config.mapping_url.as_deref(), Some("http://localhost:8083/example.csv"));
    assert_eq!(config.quiet_period(), Duration::from_secs(1));
    assert!(config.file_matching);
    assert_eq!(config.semantic_repo.as_deref(), Some("git://repo/magic/"));
    assert_eq!(config.log_format, LogFormat::Pretty);

    let jenkins = config.jenkins_config();
    assert_eq!(jenkins.folder.as_deref(), Some("multi"));
    assert_eq!(jenkins.user.as_deref(), Some("ci"));
    assert_eq!(jenkins.token, "whatever");
}

#[test]
fn test_zero_refresh_interval_is_rejected() {
    let config = parse(&["--refresh-interval=0"]);

    assert!(matches!(config.validate(), Err(RelayError::Configuration { .. })));
}

#[test]
fn test_blank_server_url_is_rejected() {
    let mut config = parse(&[]);
    config.jenkins_url = "  ".to_string();

    assert!(matches!(config.validate(), Err(RelayError::Configuration { .. })));
}

#[test]
fn test_blank_token_is_rejected() {
    let mut config = parse(&[]);
    config.jenkins_token = String::new();

    assert!(matches!(config.validate(), Err(RelayError::Configuration { .. })));
}
