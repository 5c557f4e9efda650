use serde::{Deserialize, Serialize};

/// Dashboard document. Only the name is modelled for now.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "_key", default, skip_serializing_if = "String::is_empty")]
    pub key: String,
    pub name: String,
}
