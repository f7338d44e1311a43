use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct OembedResponse {
    pub title: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub provider_name: Option<String>,
}
