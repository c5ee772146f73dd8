use std::time::Duration;
use toolgate::options::{ModelOptions, TransportOptions, DEFAULT_ADAPTER_TIMEOUT};
use toolgate::GatewayConfig;

#[test]
fn test_transport_options_builder() {
    let options = TransportOptions::new()
        .with_timeout(Duration::from_secs(3))
        .with_proxy("http://proxy.example.com")
        .with_header("X-Custom-Header", "Value");

    match options {
        TransportOptions::Http {
            timeout,
            proxy,
            headers,
        } => {
            assert_eq!(timeout, Duration::from_secs(3));
            assert_eq!(proxy, Some("http://proxy.example.com".to_string()));

            let headers = headers.unwrap();
            assert_eq!(headers.get("X-Custom-Header"), Some(&"Value".to_string()));
        }
    }
}

#[test]
fn test_transport_options_always_carry_a_timeout() {
    assert_eq!(TransportOptions::new().timeout(), DEFAULT_ADAPTER_TIMEOUT);
}

#[test]
fn test_model_options_new() {
    let options = ModelOptions::new("gpt-3.5-turbo");

    assert_eq!(options.model, "gpt-3.5-turbo");
    assert_eq!(options.temperature, None);
    assert_eq!(options.max_tokens, None);
}

#[test]
fn test_model_options_custom() {
    let options = ModelOptions::new("gpt-3.5-turbo")
        .with_temperature(0.7)
        .with_max_tokens(100);

    assert_eq!(options.temperature, Some(0.7));
    assert_eq!(options.max_tokens, Some(100));
}

#[test]
fn test_gateway_config_fills_defaults() {
    let config: GatewayConfig = serde_json::from_value(serde_json::json!({
        "provider_api_key": "sk-test"
    }))
    .unwrap();

    assert_eq!(config.record_source_timeout_secs, 5);
    assert_eq!(config.adapter_timeout_secs, 10);
    assert_eq!(config.invocation_deadline_secs, 30);
    assert_eq!(config.chat_model, "gpt-3.5-turbo");
    assert_eq!(config.embedding_model, "text-embedding-ada-002");
}
