use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::IntoParams;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page size (default 20, max 1000)
    #[param(required = false)]
    #[serde(default, deserialize_with = "deserialize_optional_u64")]
    pub limit: Option<u64>,
    /// Rows to skip (default 0)
    #[param(required = false)]
    #[serde(default, deserialize_with = "deserialize_optional_u64")]
    pub offset: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum U64Input {
    Number(u64),
    Text(String),
}

fn deserialize_optional_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<U64Input>::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(U64Input::Number(number)) => Ok(Some(number)),
        Some(U64Input::Text(text)) => text
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(DeError::custom),
    }
}

const DEFAULT_PAGE_LIMIT: u64 = 20;
const MAX_PAGE_LIMIT: u64 = 1000;

impl PaginationParams {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).min(MAX_PAGE_LIMIT) as usize
    }

    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_cap() {
        let p: PaginationParams = serde_json::from_str("{}").unwrap();
        assert_eq!(p.limit(), 20);
        assert_eq!(p.offset(), 0);

        let p: PaginationParams = serde_json::from_str(r#"{"limit": 5000, "offset": 3}"#).unwrap();
        assert_eq!(p.limit(), 1000);
        assert_eq!(p.offset(), 3);
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let p: PaginationParams =
            serde_json::from_str(r#"{"limit": " 7 ", "offset": "2"}"#).unwrap();
        assert_eq!(p.limit(), 7);
        assert_eq!(p.offset(), 2);
        assert!(serde_json::from_str::<PaginationParams>(r#"{"limit": "many"}"#).is_err());
    }
}
