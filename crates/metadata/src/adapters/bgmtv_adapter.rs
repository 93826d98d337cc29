//! BGM.tv calendar as the primary catalog

use std::sync::Arc;

use async_trait::async_trait;
use bgmtv::{BgmtvClient, CalendarSubject};

use crate::{CatalogEntry, CatalogSource, ListRequest, MediaType, ProviderError};

/// The only list BGM.tv serves
pub const CALENDAR_LIST: &str = "calendar";

/// Weekly airing calendar from BGM.tv
pub struct BgmtvCatalog {
    client: Arc<BgmtvClient>,
}

impl BgmtvCatalog {
    pub fn new(client: Arc<BgmtvClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CatalogSource for BgmtvCatalog {
    async fn fetch(&self, request: &ListRequest) -> Result<Vec<CatalogEntry>, ProviderError> {
        if request.list != CALENDAR_LIST {
            return Err(ProviderError::Other(format!(
                "BGM.tv has no list named '{}'",
                request.list
            )));
        }

        let days = self.client.get_calendar().await?;

        let entries: Vec<CatalogEntry> = days
            .into_iter()
            .filter(|day| request.weekday.is_none_or(|wd| wd == day.weekday.id))
            .flat_map(|day| day.items)
            .filter(CalendarSubject::is_anime)
            .map(CatalogEntry::from)
            .take(request.limit.unwrap_or(usize::MAX))
            .collect();

        tracing::debug!("BGM.tv calendar returned {} entries", entries.len());
        Ok(entries)
    }

    fn name(&self) -> &'static str {
        "bgmtv"
    }
}

impl From<CalendarSubject> for CatalogEntry {
    fn from(subject: CalendarSubject) -> Self {
        let image_url = subject
            .images
            .and_then(|images| images.large.or(images.common).or(images.medium));

        Self {
            source_id: subject.id.to_string(),
            title_localized: Some(subject.name_cn).filter(|s| !s.trim().is_empty()),
            title_native: Some(subject.name).filter(|s| !s.trim().is_empty()),
            title_romanized: None,
            media_type: MediaType::Tv,
            air_date: subject.air_date.filter(|s| !s.is_empty()),
            image_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_subject_into_entry() {
        let subject = CalendarSubject {
            id: 400602,
            subject_type: bgmtv::SUBJECT_TYPE_ANIME,
            name: "葬送のフリーレン".to_string(),
            name_cn: "".to_string(),
            summary: "".to_string(),
            air_date: Some("2023-09-29".to_string()),
            air_weekday: Some(5),
            images: None,
        };

        let entry = CatalogEntry::from(subject);
        assert_eq!(entry.source_id, "400602");
        assert_eq!(entry.title_localized, None);
        assert_eq!(entry.title_native.as_deref(), Some("葬送のフリーレン"));
        assert_eq!(entry.media_type, MediaType::Tv);
    }
}
