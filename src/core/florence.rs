//! Post-processing of Florence-2 style generations.
//!
//! The model answers an `<OD>` prompt with text such as
//! `</s><s>doll<loc_0><loc_0><loc_998><loc_998>human face<loc_222>...</s>`.
//! Every label is followed by four location tokens (`x1 y1 x2 y2`), each a bin
//! index out of [`LOCATION_BINS`] over the image width or height.

use crate::domain::model::Detections;
use regex::Regex;
use std::sync::OnceLock;

pub const OD_TASK: &str = "<OD>";
pub const LOCATION_BINS: u32 = 1000;

const SPECIAL_TOKENS: [&str; 3] = ["</s>", "<s>", "<pad>"];

fn box_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([^<>]*)<loc_(\d+)><loc_(\d+)><loc_(\d+)><loc_(\d+)>")
            .expect("location pattern is valid")
    })
}

/// Maps a bin index back to the centre of its pixel range.
pub fn dequantize(bin: u32, size: u32) -> f32 {
    let bin = bin.min(LOCATION_BINS - 1);
    (bin as f32 + 0.5) * size as f32 / LOCATION_BINS as f32
}

pub fn strip_special_tokens(text: &str) -> String {
    SPECIAL_TOKENS
        .iter()
        .fold(text.to_string(), |acc, token| acc.replace(token, ""))
}

/// Parses an `<OD>` generation into pixel boxes for an image of
/// `width x height`. Labels are reduced to their ASCII characters; a box
/// without its own label belongs to the previous label.
pub fn parse_od(text: &str, width: u32, height: u32) -> Detections {
    let cleaned = strip_special_tokens(text);
    let mut detections = Detections::default();
    let mut last_label: Option<String> = None;

    for caps in box_pattern().captures_iter(&cleaned) {
        // 與 Florence 相同，標籤只保留 ASCII 字元
        let label: String = caps[1].chars().filter(char::is_ascii).collect();
        let label = label.trim();
        let label = if label.is_empty() {
            match &last_label {
                Some(previous) => previous.clone(),
                None => {
                    tracing::debug!("Dropping unlabeled box at start of generation");
                    continue;
                }
            }
        } else {
            label.to_string()
        };

        // \d+ 可能超出 u32，超出者視為最後一個 bin
        let bin = |i: usize| caps[i].parse::<u32>().unwrap_or(LOCATION_BINS - 1);
        let bbox = [
            dequantize(bin(2), width),
            dequantize(bin(3), height),
            dequantize(bin(4), width),
            dequantize(bin(5), height),
        ];

        detections.push(bbox, label.clone());
        last_label = Some(label);
    }

    detections
}
