use droste_chain::{
    AnalysisModel, AnalysisRequest, CompositionModel, CompositionRequest, HttpImageResolver,
    ImagePayload, ImageResolver, ModelConfig, ModelError, ReplicateClient,
};
use droste_graph::MediaWikiSource;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn payload(name: &str) -> ImagePayload {
    ImagePayload::new(name, format!("data:image/png;base64,{name}"))
}

fn client(server: &MockServer) -> ReplicateClient {
    let config = ModelConfig {
        endpoint: format!("{}/api/create_n_get", server.uri()),
        ..ModelConfig::default()
    };
    ReplicateClient::new(&config, "r8_test").expect("client")
}

#[tokio::test]
async fn composite_returns_first_output_with_bearer_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/create_n_get"))
        .and(header("authorization", "Bearer r8_test"))
        .and(body_partial_json(json!({
            "version": "bytedance/seedream-4",
            "input": { "image_input": ["data:image/png;base64,prior", "data:image/png;base64,current"] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "succeeded",
            "output": ["https://replicate.delivery/a.png", "https://replicate.delivery/b.png"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = CompositionRequest::nesting(&ModelConfig::default(), &payload("prior"), &payload("current"));
    let generated = client(&server).composite(&request).await.expect("composite");
    assert_eq!(generated, "https://replicate.delivery/a.png");
}

#[tokio::test]
async fn composite_error_status_carries_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(422).set_body_string("invalid image_input"))
        .mount(&server)
        .await;

    let request = CompositionRequest::nesting(&ModelConfig::default(), &payload("a"), &payload("b"));
    let err = client(&server).composite(&request).await.unwrap_err();
    match err {
        ModelError::Status { status, body } => {
            assert_eq!(status, 422);
            assert_eq!(body, "invalid image_input");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn composite_without_output_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "output": [] })))
        .mount(&server)
        .await;

    let request = CompositionRequest::nesting(&ModelConfig::default(), &payload("a"), &payload("b"));
    let err = client(&server).composite(&request).await.unwrap_err();
    assert!(matches!(err, ModelError::EmptyOutput(_)));
}

#[tokio::test]
async fn analysis_joins_streamed_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "model": "openai/gpt-5" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": ["{\"placement\":", "{\"x\":1}}"]
        })))
        .mount(&server)
        .await;

    let request = AnalysisRequest::placement(&ModelConfig::default(), &payload("a"), &payload("b"));
    let text = client(&server).analyze(&request).await.expect("analyze");
    assert_eq!(text, "{\"placement\":\n{\"x\":1}}");
}

#[tokio::test]
async fn resolver_downloads_media_titles_as_data_urls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("titles", "File:Cat.jpg"))
        .and(query_param("prop", "imageinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": { "pages": { "-1": {
                "ns": 6, "title": "File:Cat.jpg",
                "imageinfo": [{ "url": format!("{}/media/cat.jpg", server.uri()) }]
            } } }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/cat.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(b"cat".to_vec()),
        )
        .mount(&server)
        .await;

    let wiki = MediaWikiSource::new(format!("{}/w/api.php", server.uri())).expect("wiki");
    let resolver = HttpImageResolver::new(Arc::new(wiki), Duration::from_secs(5)).expect("resolver");

    let resolved = resolver.resolve("File:Cat.jpg").await.expect("resolve");
    assert_eq!(resolved.reference, "File:Cat.jpg");
    assert_eq!(resolved.data_url, "data:image/jpeg;base64,Y2F0");

    let inline = resolver.resolve("data:image/png;base64,AAAA").await.expect("inline");
    assert_eq!(inline.data_url, "data:image/png;base64,AAAA");
}

#[tokio::test]
async fn resolver_fails_on_missing_download() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gen/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let wiki = MediaWikiSource::new(format!("{}/w/api.php", server.uri())).expect("wiki");
    let resolver = HttpImageResolver::new(Arc::new(wiki), Duration::from_secs(5)).expect("resolver");
    assert!(resolver
        .resolve(&format!("{}/gen/missing.png", server.uri()))
        .await
        .is_err());
}
