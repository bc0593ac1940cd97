use assert_cmd::Command;
use serde_json::{json, Value};
use tempfile::tempdir;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_query(server: &MockServer, params: &[(&str, &str)], body: Value) {
    let mut mock = Mock::given(method("GET")).and(path("/w/api.php"));
    for (key, value) in params {
        mock = mock.and(query_param(*key, *value));
    }
    mock.respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_image(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(route.as_bytes().to_vec()),
        )
        .mount(server)
        .await;
}

async fn mount_wiki(server: &MockServer) {
    let uri = server.uri();
    mount_query(
        server,
        &[("titles", "Cat"), ("redirects", "1")],
        json!({ "query": { "pages": { "1": { "pageid": 1, "ns": 0, "title": "Cat" } } } }),
    )
    .await;
    for (id, linkers) in [(1u64, json!([{ "pageid": 2, "ns": 0, "title": "Mona Lisa" }])), (2, json!([]))] {
        mount_query(
            server,
            &[("prop", "linkshere"), ("pageids", &id.to_string())],
            json!({ "query": { "pages": { id.to_string(): {
                "pageid": id, "ns": 0, "title": "ignored", "linkshere": linkers
            } } } }),
        )
        .await;
    }
    for (id, image) in [(1u64, "File:Cat.png"), (2, "File:Mona.png")] {
        mount_query(
            server,
            &[("prop", "images"), ("pageids", &id.to_string())],
            json!({ "query": { "pages": { id.to_string(): {
                "pageid": id, "ns": 0, "title": "ignored",
                "images": [{ "ns": 6, "title": "File:Logo.svg" }, { "ns": 6, "title": image }]
            } } } }),
        )
        .await;
    }
    for (image, route) in [("File:Cat.png", "/media/cat.png"), ("File:Mona.png", "/media/mona.png")] {
        mount_query(
            server,
            &[("prop", "imageinfo"), ("titles", image)],
            json!({ "query": { "pages": { "-1": {
                "ns": 6, "title": image, "imageinfo": [{ "url": format!("{uri}{route}") }]
            } } } }),
        )
        .await;
        mount_image(server, route).await;
    }
}

async fn mount_models(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(header("authorization", "Bearer secret"))
        .and(body_partial_json(json!({ "version": "bytedance/seedream-4" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": [format!("{}/gen/0.png", server.uri())]
        })))
        .expect(1)
        .mount(server)
        .await;
    mount_image(server, "/gen/0.png").await;

    let spaced: String = r#"{"placement":{"x":35,"y":20,"width":30,"height":25,"centerX":50,"centerY":32.5,"description":"framed","confidence":0.9}}"#
        .chars()
        .flat_map(|c| [c, ' '])
        .collect();
    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(body_partial_json(json!({ "model": "openai/gpt-5" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "output": [spaced] })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn search_walks_composites_and_persists() {
    let server = MockServer::start().await;
    mount_wiki(&server).await;
    mount_models(&server).await;

    let temp = tempdir().expect("tempdir");
    let store = temp.path().join("frames.json");
    let workdir = temp.path().to_path_buf();
    let api_url = format!("{}/w/api.php", server.uri());
    let endpoint = format!("{}/predict", server.uri());

    let output = tokio::task::spawn_blocking(move || {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("droste").expect("binary");
        cmd.current_dir(&workdir)
            .env_remove("DROSTE_CONFIG")
            .env("DROSTE_API_TOKEN", "secret")
            .args(["--quiet", "--store"])
            .arg(&store)
            .args(["search", "Cat", "--depth", "1", "--rng-seed", "3"])
            .args(["--api-url", &api_url, "--endpoint", &endpoint])
            .output()
            .expect("command run")
    })
    .await
    .expect("join");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");

    assert_eq!(body["seed"], "Cat");
    assert_eq!(body["trail"], json!([{ "from": "Mona Lisa", "to": "Cat", "hop": 0 }]));
    let frames = body["frames"].as_array().expect("frames");
    assert_eq!(frames.len(), 2);

    assert_eq!(frames[0]["title"], "Cat");
    assert_eq!(frames[0]["source_image_ref"], "File:Cat.png");
    assert!(frames[0]["placement"].is_null());
    assert_eq!(frames[0]["is_generated"], false);

    assert_eq!(frames[1]["title"], "Mona Lisa");
    assert_eq!(frames[1]["prior_input_ref"], "File:Cat.png");
    assert_eq!(frames[1]["generated_image_ref"], format!("{}/gen/0.png", server.uri()));
    assert_eq!(frames[1]["is_generated"], true);
    assert_eq!(frames[1]["placement"]["centerY"], 32.5);
    assert_eq!(frames[1]["article_url"], "https://en.wikipedia.org/?curid=2");
}
