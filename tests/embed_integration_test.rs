use anyhow::Result;
use eternal_tools::adapters::OllamaEmbedder;
use eternal_tools::EmbeddingRun;
use httpmock::prelude::*;
use std::time::Duration;

fn mock_ollama(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST)
            .path("/api/embed")
            .json_body(serde_json::json!({
                "model": "gist",
                "input": ["abcd", "ef", "xy"]
            }));
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "model": "gist",
                "embeddings": [[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]
            }));
    })
}

/// 切塊、嵌入、相似度矩陣整條流程
#[tokio::test]
async fn test_embedding_run_against_ollama() -> Result<()> {
    let server = MockServer::start();
    let mock = mock_ollama(&server);

    let embedder = OllamaEmbedder::new(&server.base_url(), "gist", Duration::from_secs(5))?;
    let run = EmbeddingRun::new(embedder, 4, 0);
    let report = run
        .run(&["abcdef".to_string(), "xy".to_string()])
        .await?;

    mock.assert();
    assert_eq!(report.model, "gist");
    assert_eq!(report.chunks.len(), 3);
    assert_eq!(report.chunks[2].source_index, 1);
    assert_eq!(report.dimensions(), 2);

    let sim = &report.similarity;
    assert_eq!(sim.len(), 3);
    assert!((sim[0][0] - 1.0).abs() < 1e-4);
    assert!(sim[0][1].abs() < 1e-4);
    assert!((sim[0][2] - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-4);
    assert!((sim[2][0] - sim[0][2]).abs() < 1e-6);
    Ok(())
}

#[tokio::test]
async fn test_backend_error_is_reported() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/embed");
        then.status(404)
            .json_body(serde_json::json!({"error": "model \"gist\" not found"}));
    });

    let embedder = OllamaEmbedder::new(&server.base_url(), "gist", Duration::from_secs(5))?;
    let result = EmbeddingRun::new(embedder, 4, 0)
        .run(&["abcdef".to_string()])
        .await;

    let error = result.unwrap_err();
    assert!(error.to_string().contains("not found"));
    assert_eq!(error.exit_code(), 1);
    Ok(())
}

#[tokio::test]
async fn test_embed_binary_prints_chunks_and_matrix() -> Result<()> {
    let server = MockServer::start();
    let mock = mock_ollama(&server);
    let output_dir = tempfile::tempdir()?;
    let report_path = output_dir.path().join("report.json");

    let output = tokio::process::Command::new(env!("CARGO_BIN_EXE_embed"))
        .args(["--model-name", "gist", "--chunk-size", "4", "--chunk-overlap", "0"])
        .args(["--texts", "abcdef", "xy"])
        .args(["--backend-url", &server.base_url()])
        .arg("--output-json")
        .arg(&report_path)
        .output()
        .await?;

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    mock.assert();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Chunk: abcd"));
    assert!(stdout.contains("Embedding: [1.0000, 0.0000]"));
    assert!(stdout.contains("[[ 1.0000  0.0000  0.7071]"));

    let report: serde_json::Value = serde_json::from_slice(&std::fs::read(&report_path)?)?;
    assert_eq!(report["chunks"].as_array().map(Vec::len), Some(3));
    Ok(())
}

#[tokio::test]
async fn test_embed_binary_rejects_overlap_not_below_size() -> Result<()> {
    let output = tokio::process::Command::new(env!("CARGO_BIN_EXE_embed"))
        .args(["--chunk-size", "8", "--chunk-overlap", "8"])
        .args(["--backend-url", "http://127.0.0.1:9"])
        .output()
        .await?;

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("chunk_overlap"));
    Ok(())
}
