//! A [`JsonTransport`] that serves saved responses from a directory.
//!
//! Page `n` of any path is read from `<dir>/page-<n>.json`. A missing file
//! answers 404.

use std::path::PathBuf;

use async_trait::async_trait;
use viewsync_core::FetchError;
use viewsync_engine::JsonTransport;

pub struct DirTransport {
    dir: PathBuf,
}

impl DirTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn page_file(&self, params: &[(String, String)]) -> Result<PathBuf, FetchError> {
        let page = params
            .iter()
            .find(|(key, _)| key == "page")
            .map(|(_, value)| value.as_str())
            .unwrap_or("1");
        let page: u32 = page
            .parse()
            .map_err(|_| FetchError::Network(format!("bad page parameter: {page}")))?;
        Ok(self.dir.join(format!("page-{page}.json")))
    }
}

#[async_trait]
impl JsonTransport for DirTransport {
    async fn get_json(
        &self,
        path: &str,
        params: Vec<(String, String)>,
    ) -> Result<serde_json::Value, FetchError> {
        let file = self.page_file(&params)?;
        tracing::debug!("{} -> {}", path, file.display());

        let text = match std::fs::read_to_string(&file) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FetchError::Status {
                    status: 404,
                    message: format!("{} not found", file.display()),
                });
            }
            Err(e) => return Err(FetchError::Network(e.to_string())),
        };
        serde_json::from_str(&text).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: u32) -> Vec<(String, String)> {
        vec![("page".to_string(), n.to_string())]
    }

    #[tokio::test]
    async fn test_reads_page_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page-2.json"), r#"{"count": 0, "results": []}"#).unwrap();

        let transport = DirTransport::new(dir.path());
        let body = transport.get_json("/feeds/", page(2)).await.unwrap();
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn test_missing_page_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let transport = DirTransport::new(dir.path());

        let err = transport.get_json("/feeds/", page(1)).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page-1.json"), "not json").unwrap();

        let transport = DirTransport::new(dir.path());
        let err = transport.get_json("/feeds/", Vec::new()).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
