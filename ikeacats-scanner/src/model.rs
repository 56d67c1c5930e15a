use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// One entry of the catalogue index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

impl Listing {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// A resolved download target: the publication title and its PDF URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalogue {
    pub title: String,
    pub url: String,
}

impl Catalogue {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }

    /// File name the catalogue is saved under. Path separators in the title
    /// are replaced so the file stays inside the target directory.
    pub fn file_name(&self) -> String {
        let stem: String = self
            .title
            .chars()
            .map(|c| if c == '/' || c == '\\' { '-' } else { c })
            .collect();
        format!("{}.pdf", stem)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadedFile {
    pub title: String,
    pub url: String,
    pub path: PathBuf,
    pub bytes: u64,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}
