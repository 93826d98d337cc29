use serde::{Deserialize, Serialize};

/// BGM.tv subject type code for anime
pub const SUBJECT_TYPE_ANIME: i32 = 2;

/// Weekday descriptor in the calendar response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weekday {
    pub en: String,
    pub cn: String,
    pub ja: String,
    pub id: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarImages {
    pub large: Option<String>,
    pub common: Option<String>,
    pub medium: Option<String>,
    pub small: Option<String>,
}

/// Subject entry in GET /calendar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarSubject {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub subject_type: i32,
    pub name: String,
    #[serde(default)]
    pub name_cn: String,
    #[serde(default)]
    pub summary: String,
    pub air_date: Option<String>,
    pub air_weekday: Option<i32>,
    pub images: Option<CalendarImages>,
}

impl CalendarSubject {
    pub fn is_anime(&self) -> bool {
        self.subject_type == SUBJECT_TYPE_ANIME
    }
}

/// One day of the weekly schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarDay {
    pub weekday: Weekday,
    #[serde(default)]
    pub items: Vec<CalendarSubject>,
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(body: &str) -> crate::Result<T> {
    let deserializer = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(deserializer).map_err(|e| crate::BgmtvError::Json {
        path: e.path().to_string(),
        source: e.into_inner(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_calendar() {
        let body = r#"[
            {
                "weekday": {"en": "Mon", "cn": "星期一", "ja": "月耀日", "id": 1},
                "items": [
                    {
                        "id": 400602,
                        "type": 2,
                        "name": "葬送のフリーレン",
                        "name_cn": "葬送的芙莉莲",
                        "summary": "",
                        "air_date": "2023-09-29",
                        "air_weekday": 5,
                        "images": {"large": "https://lain.bgm.tv/pic/cover/l/13/c5.jpg"}
                    },
                    {"id": 1, "name": "Unknown"}
                ]
            }
        ]"#;

        let days: Vec<CalendarDay> = decode(body).unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].weekday.id, 1);
        assert_eq!(days[0].items.len(), 2);
        assert!(days[0].items[0].is_anime());
        assert!(!days[0].items[1].is_anime());
        assert_eq!(days[0].items[0].name_cn, "葬送的芙莉莲");
        assert_eq!(days[0].items[1].name_cn, "");
    }

    #[test]
    fn test_decode_reports_json_path() {
        let body = r#"[{"weekday": {"en": "Mon", "cn": "", "ja": "", "id": "one"}}]"#;
        let err = decode::<Vec<CalendarDay>>(body).unwrap_err();
        match err {
            crate::BgmtvError::Json { path, .. } => assert_eq!(path, "[0].weekday.id"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
