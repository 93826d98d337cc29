use serde::{Deserialize, Serialize};

/// Every v4 response is wrapped in `{"status": "...", "data": ...}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub apikey: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoginData {
    pub token: String,
}

/// GET /series/{id}
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesBase {
    pub id: i64,
    pub name: String,
    pub overview: Option<String>,
    pub original_language: Option<String>,
    pub first_aired: Option<String>,
    pub image: Option<String>,
}

/// GET /series/{id}/translations/{language}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Translation {
    pub name: Option<String>,
    pub overview: Option<String>,
    pub language: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(body: &str) -> crate::Result<T> {
    let deserializer = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(deserializer).map_err(|e| crate::TvdbError::Json {
        path: e.path().to_string(),
        source: e.into_inner(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_translation_envelope() {
        let body = r#"{"status": "success", "data": {"name": "Frieren - Nach dem Ende der Reise", "overview": "Die Elfe...", "language": "deu"}}"#;
        let envelope: Envelope<Translation> = decode(body).unwrap();
        assert_eq!(envelope.data.language, "deu");
        assert!(envelope.data.aliases.is_empty());
    }

    #[test]
    fn test_decode_series_base() {
        let body = r#"{"status": "success", "data": {"id": 424536, "name": "葬送のフリーレン", "originalLanguage": "jpn", "firstAired": "2023-09-29"}}"#;
        let envelope: Envelope<SeriesBase> = decode(body).unwrap();
        assert_eq!(envelope.data.id, 424536);
        assert_eq!(envelope.data.original_language.as_deref(), Some("jpn"));
        assert!(envelope.data.overview.is_none());
    }
}
