// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Task and annotation result payloads.
//!
//! Both are JSON. A task's `data` may arrive either as a record or as a
//! string holding a serialized record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::EngineError;

/// The item being labeled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub data: TaskData,
    /// Queue label shown alongside the task, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskData {
    Record(Map<String, Value>),
    Serialized(String),
}

impl Task {
    pub fn new(id: u64, data: Map<String, Value>) -> Self {
        Self {
            id,
            data: TaskData::Record(data),
            queue: None,
        }
    }

    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        serde_json::from_str(text).map_err(|e| EngineError::TaskData(e.to_string()))
    }

    /// The task data as a record, deserializing it when it arrived as a string.
    pub fn data_record(&self) -> Result<Map<String, Value>, EngineError> {
        match &self.data {
            TaskData::Record(record) => Ok(record.clone()),
            TaskData::Serialized(text) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(record)) => Ok(record),
                Ok(other) => Err(EngineError::TaskData(format!(
                    "expected a record, found {}",
                    other
                ))),
                Err(e) => Err(EngineError::TaskData(e.to_string())),
            },
        }
    }
}

/// One annotation result. Each region a control tag produces is one result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionResult {
    pub id: String,
    pub from_name: String,
    pub to_name: String,
    #[serde(rename = "type")]
    pub result_type: String,
    pub value: Value,
}

impl RegionResult {
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "id": self.id,
            "from_name": self.from_name,
            "to_name": self.to_name,
            "type": self.result_type,
            "value": self.value,
        })
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_data_forms() {
        let record = Task::from_json(r#"{"id": 7, "data": {"text": "hi"}}"#).unwrap();
        assert_eq!(record.data_record().unwrap()["text"], json!("hi"));

        let serialized =
            Task::from_json(r#"{"id": 8, "data": "{\"text\": \"hi\"}", "queue": "q1"}"#).unwrap();
        assert_eq!(serialized.queue.as_deref(), Some("q1"));
        assert_eq!(serialized.data_record().unwrap()["text"], json!("hi"));
    }

    #[test]
    fn test_task_data_errors() {
        let not_record = Task::from_json(r#"{"id": 1, "data": "[1, 2]"}"#).unwrap();
        assert!(matches!(not_record.data_record(), Err(EngineError::TaskData(_))));

        let broken = Task::from_json(r#"{"id": 1, "data": "{nope"}"#).unwrap();
        assert!(matches!(broken.data_record(), Err(EngineError::TaskData(_))));

        assert!(matches!(Task::from_json("{}"), Err(EngineError::TaskData(_))));
    }

    #[test]
    fn test_region_result_wire_shape() {
        let result = RegionResult {
            id: "r1".to_string(),
            from_name: "sentiment".to_string(),
            to_name: "text".to_string(),
            result_type: "choices".to_string(),
            value: json!({"choices": ["Positive"]}),
        };
        let value = result.to_value();
        assert_eq!(value["type"], json!("choices"));
        assert_eq!(RegionResult::from_value(&value), Some(result));
        assert_eq!(RegionResult::from_value(&json!({"id": "x"})), None);
    }
}
