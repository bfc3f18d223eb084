fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use streamvod_protocol::{
        CompleteUploadRequest, CompleteUploadResponse, ErrorBody, InitiateUploadResponse,
        PartUrlsRequest, PartUrlsResponse,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (key order is irrelevant).
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  Backend: {fixture}\n  Rust:    {reserialized}"
        );
        parsed
    }

    // --- Session requests ---

    #[test]
    fn fixture_part_urls_request() {
        let req = roundtrip_test::<PartUrlsRequest>("part_urls_request.json");
        assert_eq!(req.num_parts, 3);
    }

    #[test]
    fn fixture_complete_request() {
        let req = roundtrip_test::<CompleteUploadRequest>("complete_request.json");
        let numbers: Vec<u32> = req.parts.iter().map(|p| p.part_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(
            req.parts[0].etag.starts_with('"'),
            "ETags are sent back with their quotes"
        );
    }

    // --- Session responses ---

    #[test]
    fn fixture_initiate_response() {
        let resp = roundtrip_test::<InitiateUploadResponse>("initiate_response.json");
        assert!(resp.key.starts_with("uploads/"));
        assert!(resp.key.contains(&resp.video_id));
    }

    #[test]
    fn fixture_part_urls_response() {
        let resp = roundtrip_test::<PartUrlsResponse>("part_urls_response.json");
        assert_eq!(resp.parts.len(), 3);
        for (i, part) in resp.parts.iter().enumerate() {
            assert_eq!(part.part_number as usize, i + 1);
            assert!(part.url.contains(&format!("partNumber={}", i + 1)));
        }
    }

    #[test]
    fn fixture_complete_response() {
        let resp = roundtrip_test::<CompleteUploadResponse>("complete_response.json");
        assert_eq!(resp.status, "processing");
    }

    #[test]
    fn complete_response_without_message() {
        let json = r#"{"video_id":"v1","status":"processing"}"#;
        let resp: CompleteUploadResponse = serde_json::from_str(json).unwrap();
        assert!(resp.message.is_empty(), "missing message should default to empty");
    }

    #[test]
    fn unknown_response_fields_ignored() {
        let json = r#"{"video_id":"v1","upload_id":"u1","key":"uploads/v1.mp4","bucket":"src"}"#;
        let resp: InitiateUploadResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.upload_id, "u1");
    }

    // --- Error bodies ---

    #[test]
    fn fixture_error_detail() {
        let body = roundtrip_test::<ErrorBody>("error_detail.json");
        assert_eq!(body.message(), "Not authorized");
    }

    #[test]
    fn fixture_error_validation() {
        let body = roundtrip_test::<ErrorBody>("error_validation.json");
        assert_eq!(body.message(), "field required; str type expected");
    }
}
