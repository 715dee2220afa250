use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SearchTracksParams {
    pub keyword: String,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<Artist>,
}

#[derive(Debug, Serialize)]
pub struct SearchTracksResponse {
    pub tracks: Vec<Track>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_require_only_keyword() {
        let params: SearchTracksParams =
            serde_urlencoded::from_str("keyword=One").expect("keyword alone is enough");
        assert_eq!(params.keyword, "One");
        assert!(params.limit.is_none());
        assert!(params.offset.is_none());

        let params: SearchTracksParams =
            serde_urlencoded::from_str("keyword=One&limit=5&offset=10").unwrap();
        assert_eq!(params.limit, Some(5));
        assert_eq!(params.offset, Some(10));
    }

    #[test]
    fn response_shape() {
        let response = SearchTracksResponse {
            tracks: vec![Track {
                id: "2up3OPMp9Tb4dAKM2erWXQ".into(),
                name: "One".into(),
                artists: vec![Artist {
                    id: "artist-id".into(),
                    name: "Aimee Mann".into(),
                }],
            }],
            total: 1,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"total\":1"));
        assert!(json.contains("Aimee Mann"));
    }
}
