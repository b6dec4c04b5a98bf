use crate::dependencies::ApiClient;

/// Client model
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientRecord {
    pub name: String,
    pub is_validator: bool,
}

impl ClientRecord {
    pub fn new(name: impl Into<String>, is_validator: bool) -> Self {
        Self {
            name: name.into(),
            is_validator,
        }
    }
}

impl From<ApiClient> for ClientRecord {
    fn from(client: ApiClient) -> Self {
        ClientRecord::new(client.name, client.validator)
    }
}
