//! Opt-in infra tests that boot LocalStack via testcontainers.
//!
//! Run (requires Docker):
//!   cargo test --features aws-testcontainers --test localstack -- --nocapture

#![cfg(feature = "aws-testcontainers")]

use std::time::Duration;

use testcontainers::core::IntoContainerPort;
use testcontainers::{GenericImage, ImageExt, runners::AsyncRunner};
use weightlog::handler::ReadParams;
use weightlog::model::Measurement;
use weightlog::store::{DynamoStore, MeasurementStore};

const LOCALSTACK_EDGE_PORT: u16 = 4566;
const REGION: &str = "us-east-1";

/// Build an SDK config with an explicit endpoint pointing at LocalStack.
async fn sdk_config_for_endpoint(endpoint: &str) -> aws_config::SdkConfig {
    use aws_config::meta::region::RegionProviderChain;
    // Dummy credentials accepted by LocalStack; an explicit provider also
    // keeps the SDK away from IMDS lookups in tests
    let credentials =
        aws_sdk_dynamodb::config::Credentials::new("test", "test", None, None, "localstack");
    let region_provider = RegionProviderChain::default_provider().or_else(REGION);
    aws_config::defaults(aws_config::BehaviorVersion::latest())
        .credentials_provider(credentials)
        .region(region_provider)
        .endpoint_url(endpoint)
        .load()
        .await
}

async fn wait_for_dynamodb(sdk_config: &aws_config::SdkConfig) {
    let client = aws_sdk_dynamodb::Client::new(sdk_config);
    for _ in 0..60 {
        if client.list_tables().send().await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    panic!("DynamoDB did not become ready in time");
}

/// Boot LocalStack and provision the measurements table, returning
/// (container, store). The container must stay alive for the test's duration.
async fn setup_localstack_store(
    table: &str,
) -> (testcontainers::ContainerAsync<GenericImage>, DynamoStore) {
    let image = GenericImage::new("localstack/localstack", "latest")
        .with_exposed_port(LOCALSTACK_EDGE_PORT.tcp())
        .with_env_var("SERVICES", "dynamodb")
        .with_env_var("DEFAULT_REGION", REGION)
        .with_env_var("SKIP_SSL_CERT_DOWNLOAD", "1");
    let container = image
        .start()
        .await
        .expect("LocalStack started (Docker must be running)");
    let host_port = container
        .get_host_port_ipv4(LOCALSTACK_EDGE_PORT)
        .await
        .expect("LocalStack edge port mapped");
    let endpoint = format!("http://127.0.0.1:{host_port}");
    let sdk_config = sdk_config_for_endpoint(&endpoint).await;
    wait_for_dynamodb(&sdk_config).await;

    let client = aws_sdk_dynamodb::Client::new(&sdk_config);
    let store = DynamoStore::from_client(client, table.to_string());
    store.ensure_table().await.expect("table creation failed");

    (container, store)
}

fn params(from: &str, to: &str, inclusive: bool, limit: i32) -> ReadParams {
    ReadParams {
        from: from.to_string(),
        to: to.to_string(),
        limit,
        inclusive,
        timezone_offset: 0,
    }
}

fn measurement(name: &str, datetime: &str, weight: f64) -> Measurement {
    Measurement {
        name: name.to_string(),
        datetime: datetime.to_string(),
        weight,
    }
}

#[tokio::test]
async fn localstack_write_then_read_range() {
    let (_container, store) = setup_localstack_store("weightlog-test").await;

    store
        .put(&measurement("fido", "2023-07-01T00:00:00", 12.0))
        .await
        .expect("put should succeed");
    store
        .put(&measurement("fido", "2023-07-02T00:00:00", 12.5))
        .await
        .expect("put should succeed");
    store
        .put(&measurement("fido", "2023-08-01T00:00:00", 13.0))
        .await
        .expect("put should succeed");
    // Another subject must never leak into fido's results
    store
        .put(&measurement("rex", "2023-07-01T12:00:00", 30.0))
        .await
        .expect("put should succeed");

    let july = store
        .query(
            "fido",
            &params("2023-07-01T00:00:00", "2023-07-31T23:59:59", true, 1000),
        )
        .await
        .expect("query should succeed");
    assert_eq!(
        july,
        vec![
            measurement("fido", "2023-07-01T00:00:00", 12.0),
            measurement("fido", "2023-07-02T00:00:00", 12.5),
        ]
    );

    // Exclusive lower bound drops the boundary record
    let exclusive = store
        .query(
            "fido",
            &params("2023-07-01T00:00:00", "2023-07-31T23:59:59", false, 1000),
        )
        .await
        .expect("query should succeed");
    assert_eq!(
        exclusive,
        vec![measurement("fido", "2023-07-02T00:00:00", 12.5)]
    );

    // Limit truncates from the front of the range
    let limited = store
        .query(
            "fido",
            &params("2023-01-01T00:00:00", "2024-01-01T00:00:00", true, 2),
        )
        .await
        .expect("query should succeed");
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].datetime, "2023-07-01T00:00:00");
}

#[tokio::test]
async fn localstack_put_overwrites_same_instant() {
    let (_container, store) = setup_localstack_store("weightlog-overwrite-test").await;

    store
        .put(&measurement("fido", "2023-07-01T00:00:00", 12.0))
        .await
        .expect("put should succeed");
    store
        .put(&measurement("fido", "2023-07-01T00:00:00", 12.75))
        .await
        .expect("put should succeed");

    let got = store
        .query(
            "fido",
            &params("2023-01-01T00:00:00", "2024-01-01T00:00:00", true, 1000),
        )
        .await
        .expect("query should succeed");
    assert_eq!(got, vec![measurement("fido", "2023-07-01T00:00:00", 12.75)]);
}

#[tokio::test]
async fn localstack_query_survives_hostile_subject_names() {
    let (_container, store) = setup_localstack_store("weightlog-binding-test").await;

    store
        .put(&measurement("fido", "2023-07-01T00:00:00", 12.0))
        .await
        .expect("put should succeed");

    // A name full of statement syntax is just an unknown key, never executed
    let hostile = "fido' OR \"name\" = 'rex";
    let got = store
        .query(
            hostile,
            &params("2023-01-01T00:00:00", "2024-01-01T00:00:00", true, 1000),
        )
        .await
        .expect("query should succeed");
    assert!(got.is_empty());
}
