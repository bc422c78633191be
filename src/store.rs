use std::collections::HashMap;
use std::env;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::Value;

use crate::codec;
use crate::config::Config;
use crate::error::StoreError;
use crate::handler::ReadParams;
use crate::model::Measurement;

pub const DEFAULT_TABLE_NAME: &str = "weightlog-measurements";

pub const ATTR_NAME: &str = "name";
pub const ATTR_DATETIME: &str = "datetime";
pub const ATTR_WEIGHT: &str = "weight";

#[async_trait]
pub trait MeasurementStore: Send + Sync {
    async fn query(
        &self,
        name: &str,
        params: &ReadParams,
    ) -> Result<Vec<Measurement>, StoreError>;
    async fn put(&self, measurement: &Measurement) -> Result<(), StoreError>;
}

pub struct DynamoStore {
    client: Client,
    table_name: String,
}

/// Caller values never reach the statement text; they are bound as
/// positional parameters. The table name comes from config, not the request.
fn build_statement(table_name: &str, inclusive: bool) -> String {
    let from_op = if inclusive { ">=" } else { ">" };
    format!(
        "SELECT \"{}\", \"{}\" FROM \"{}\" WHERE \"{}\" = ? AND \"{}\" {} ? AND \"{}\" <= ?",
        ATTR_DATETIME, ATTR_WEIGHT, table_name, ATTR_NAME, ATTR_DATETIME, from_op, ATTR_DATETIME
    )
}

impl DynamoStore {
    pub async fn new(cfg: &Config) -> Result<Self, StoreError> {
        let region = env::var("AWS_REGION")?;

        let mut loader = aws_config::from_env().region(aws_config::Region::new(region));
        // Endpoint override is only needed against LocalStack and friends
        if let Ok(endpoint_url) = env::var("AWS_ENDPOINT_URL_DYNAMODB") {
            loader = loader.endpoint_url(endpoint_url);
        }
        let config = loader.load().await;

        let client = Client::new(&config);

        Ok(Self {
            client,
            table_name: cfg.app.get_table().to_string(),
        })
    }

    pub fn from_client(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }

    fn item_to_measurement(
        name: &str,
        item: &HashMap<String, AttributeValue>,
    ) -> Result<Measurement, StoreError> {
        let doc = codec::decode_item(item);

        let datetime = doc
            .get(ATTR_DATETIME)
            .and_then(|v| v.as_str())
            .ok_or_else(|| StoreError::MalformedItem(ATTR_DATETIME.to_string()))?
            .to_string();

        let weight = doc
            .get(ATTR_WEIGHT)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| StoreError::MalformedItem(ATTR_WEIGHT.to_string()))?;

        Ok(Measurement {
            name: name.to_string(),
            datetime,
            weight,
        })
    }

    /// Creates the measurements table when it does not exist yet and waits
    /// for it to become active. Intended for LocalStack and dev setups;
    /// production tables are provisioned out of band.
    pub async fn ensure_table(&self) -> Result<(), StoreError> {
        use aws_sdk_dynamodb::types::{
            AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType,
            TableStatus,
        };

        let tables = self
            .client
            .list_tables()
            .send()
            .await
            .map_err(|e| StoreError::DynamoError(Box::new(e)))?;

        if !tables.table_names().contains(&self.table_name) {
            self.client
                .create_table()
                .table_name(&self.table_name)
                .attribute_definitions(
                    AttributeDefinition::builder()
                        .attribute_name(ATTR_NAME)
                        .attribute_type(ScalarAttributeType::S)
                        .build()
                        .map_err(|e| StoreError::DynamoError(Box::new(e)))?,
                )
                .attribute_definitions(
                    AttributeDefinition::builder()
                        .attribute_name(ATTR_DATETIME)
                        .attribute_type(ScalarAttributeType::S)
                        .build()
                        .map_err(|e| StoreError::DynamoError(Box::new(e)))?,
                )
                .key_schema(
                    KeySchemaElement::builder()
                        .attribute_name(ATTR_NAME)
                        .key_type(KeyType::Hash)
                        .build()
                        .map_err(|e| StoreError::DynamoError(Box::new(e)))?,
                )
                .key_schema(
                    KeySchemaElement::builder()
                        .attribute_name(ATTR_DATETIME)
                        .key_type(KeyType::Range)
                        .build()
                        .map_err(|e| StoreError::DynamoError(Box::new(e)))?,
                )
                .billing_mode(BillingMode::PayPerRequest)
                .send()
                .await
                .map_err(|e| StoreError::DynamoError(Box::new(e)))?;
        }

        for _ in 0..40 {
            let describe = self
                .client
                .describe_table()
                .table_name(&self.table_name)
                .send()
                .await;
            if let Ok(out) = describe {
                let active = out
                    .table()
                    .and_then(|t| t.table_status())
                    .map(|s| matches!(s, TableStatus::Active))
                    .unwrap_or(false);
                if active {
                    return Ok(());
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(250)).await;
        }

        Err(StoreError::TableNotReady(self.table_name.clone()))
    }
}

#[async_trait]
impl MeasurementStore for DynamoStore {
    async fn query(
        &self,
        name: &str,
        params: &ReadParams,
    ) -> Result<Vec<Measurement>, StoreError> {
        let statement = build_statement(&self.table_name, params.inclusive);

        let response = self
            .client
            .execute_statement()
            .statement(statement)
            .set_parameters(Some(vec![
                AttributeValue::S(name.to_string()),
                AttributeValue::S(params.from.clone()),
                AttributeValue::S(params.to.clone()),
            ]))
            .limit(params.limit)
            .send()
            .await
            .map_err(|e| StoreError::DynamoError(Box::new(e)))?;

        let mut measurements = Vec::with_capacity(response.items().len());
        for item in response.items() {
            measurements.push(Self::item_to_measurement(name, item)?);
        }

        Ok(measurements)
    }

    async fn put(&self, measurement: &Measurement) -> Result<(), StoreError> {
        let mut doc = serde_json::Map::new();
        doc.insert(
            ATTR_NAME.to_string(),
            Value::String(measurement.name.clone()),
        );
        doc.insert(
            ATTR_DATETIME.to_string(),
            Value::String(measurement.datetime.clone()),
        );
        doc.insert(ATTR_WEIGHT.to_string(), Value::from(measurement.weight));

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(codec::encode_item(&doc)))
            .send()
            .await
            .map_err(|e| StoreError::DynamoError(Box::new(e)))?;

        Ok(())
    }
}

#[cfg(test)]
pub struct MemoryStore {
    items: std::sync::Mutex<std::collections::BTreeMap<(String, String), f64>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self {
            items: std::sync::Mutex::new(std::collections::BTreeMap::new()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl MeasurementStore for MemoryStore {
    async fn query(
        &self,
        name: &str,
        params: &ReadParams,
    ) -> Result<Vec<Measurement>, StoreError> {
        let items = self.items.lock().unwrap();

        let mut measurements = Vec::new();
        for ((item_name, datetime), weight) in items.iter() {
            if item_name != name {
                continue;
            }
            let above_from = if params.inclusive {
                datetime.as_str() >= params.from.as_str()
            } else {
                datetime.as_str() > params.from.as_str()
            };
            if !above_from || datetime.as_str() > params.to.as_str() {
                continue;
            }

            measurements.push(Measurement {
                name: item_name.clone(),
                datetime: datetime.clone(),
                weight: *weight,
            });
            if measurements.len() as i32 >= params.limit {
                break;
            }
        }

        Ok(measurements)
    }

    async fn put(&self, measurement: &Measurement) -> Result<(), StoreError> {
        self.items.lock().unwrap().insert(
            (measurement.name.clone(), measurement.datetime.clone()),
            measurement.weight,
        );
        Ok(())
    }
}
