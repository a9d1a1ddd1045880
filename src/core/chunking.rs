use crate::domain::model::Chunk;
use crate::utils::error::{Result, ToolError};

/// Cuts every text into windows of `chunk_size` characters, each window starting
/// `chunk_size - chunk_overlap` characters after the previous one. The last
/// windows of a text may be shorter than `chunk_size`.
pub fn split_texts(texts: &[String], chunk_size: usize, chunk_overlap: usize) -> Result<Vec<Chunk>> {
    if chunk_size == 0 {
        return Err(ToolError::validation("chunk_size must be at least 1"));
    }
    if chunk_overlap >= chunk_size {
        return Err(ToolError::validation(format!(
            "chunk_overlap ({}) must be smaller than chunk_size ({})",
            chunk_overlap, chunk_size
        )));
    }

    let step = chunk_size - chunk_overlap;
    let mut chunks = Vec::new();

    for (source_index, text) in texts.iter().enumerate() {
        // 以字元為單位切割，避免切斷 UTF-8 多位元組字元
        let chars: Vec<char> = text.chars().collect();
        let mut offset = 0;
        while offset < chars.len() {
            let end = (offset + chunk_size).min(chars.len());
            chunks.push(Chunk {
                source_index,
                offset,
                text: chars[offset..end].iter().collect(),
            });
            offset += step;
        }
    }

    tracing::debug!(
        "Split {} texts into {} chunks (size {}, overlap {})",
        texts.len(),
        chunks.len(),
        chunk_size,
        chunk_overlap
    );

    Ok(chunks)
}
