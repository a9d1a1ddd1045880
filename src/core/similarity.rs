const EPSILON: f32 = 1e-8;

/// Cosine similarity with the norm product clamped to `1e-8`, so zero vectors
/// score 0 instead of NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt()).max(EPSILON)
}

/// Pairwise cosine similarity, `n x n` for `n` embeddings.
pub fn similarity_matrix(embeddings: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let n = embeddings.len();
    let mut matrix = vec![vec![0.0f32; n]; n];

    for i in 0..n {
        for j in i..n {
            let score = cosine_similarity(&embeddings[i], &embeddings[j]);
            matrix[i][j] = score;
            matrix[j][i] = score;
        }
    }

    matrix
}

/// numpy-like rendering: `[[1.0000 0.5000]\n [0.5000 1.0000]]`
pub fn format_matrix(matrix: &[Vec<f32>]) -> String {
    if matrix.is_empty() {
        return "[]".to_string();
    }

    let rows: Vec<String> = matrix
        .iter()
        .map(|row| {
            let cells: Vec<String> = row.iter().map(|v| format!("{:>7.4}", v)).collect();
            format!("[{}]", cells.join(" "))
        })
        .collect();

    format!("[{}]", rows.join("\n "))
}

/// Prints at most three leading and three trailing values of long vectors.
pub fn format_embedding(embedding: &[f32]) -> String {
    let fmt = |values: &[f32]| -> Vec<String> { values.iter().map(|v| format!("{:.4}", v)).collect() };

    if embedding.len() <= 6 {
        return format!("[{}]", fmt(embedding).join(", "));
    }

    let head = fmt(&embedding[..3]);
    let tail = fmt(&embedding[embedding.len() - 3..]);
    format!(
        "[{}, ..., {}] (dim={})",
        head.join(", "),
        tail.join(", "),
        embedding.len()
    )
}
