//! Text detection response parsing
//!
//! The provider response is validated strictly: once a request was made,
//! a malformed answer is an error, never an empty result.

use super::{OcrResult, Vertex, Word};
use crate::error::OcrError;
use serde::Deserialize;

/// Block types that contribute words
const TEXT_BLOCK_TYPES: [&str; 2] = ["TEXT", "TABLE"];

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    responses: Option<Vec<ImageResponse>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    full_text_annotation: Option<TextAnnotation>,
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    pages: Option<Vec<Page>>,
}

#[derive(Debug, Deserialize)]
struct Page {
    property: Option<TextProperty>,
    #[serde(default)]
    blocks: Vec<Block>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextProperty {
    detected_languages: Option<Vec<DetectedLanguage>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectedLanguage {
    language_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Block {
    block_type: Option<String>,
    #[serde(default)]
    paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Deserialize)]
struct Paragraph {
    #[serde(default)]
    words: Vec<WordAnnotation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WordAnnotation {
    bounding_box: Option<BoundingPoly>,
    #[serde(default)]
    symbols: Vec<Symbol>,
}

#[derive(Debug, Deserialize)]
struct BoundingPoly {
    #[serde(default)]
    vertices: Vec<Vertex>,
}

#[derive(Debug, Deserialize)]
struct Symbol {
    #[serde(default)]
    text: String,
}

/// Parse a raw `images:annotate` response body
pub(crate) fn parse_annotation(body: &str) -> Result<OcrResult, OcrError> {
    let response: AnnotateResponse = serde_json::from_str(body)
        .map_err(|e| OcrError::Format(format!("invalid JSON: {}", e)))?;

    let first = response
        .responses
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| OcrError::Format("missing responses[0]".into()))?;

    if let Some(status) = first.error {
        return Err(OcrError::Provider {
            status: u16::try_from(status.code).unwrap_or(0),
            body: status.message,
        });
    }

    let page = first
        .full_text_annotation
        .ok_or_else(|| OcrError::Format("missing fullTextAnnotation".into()))?
        .pages
        .and_then(|p| p.into_iter().next())
        .ok_or_else(|| OcrError::Format("missing fullTextAnnotation.pages[0]".into()))?;

    let languages = page
        .property
        .and_then(|p| p.detected_languages)
        .ok_or_else(|| OcrError::Format("missing property.detectedLanguages".into()))?;
    let detected_language = top_language(languages)?;

    let mut words = Vec::new();
    for block in page.blocks {
        let is_text = block
            .block_type
            .as_deref()
            .is_some_and(|t| TEXT_BLOCK_TYPES.contains(&t));
        if !is_text {
            continue;
        }

        for paragraph in block.paragraphs {
            for word in paragraph.words {
                let id = words.len();
                let bounding_box = word
                    .bounding_box
                    .ok_or_else(|| OcrError::Format(format!("word {} has no boundingBox", id)))?
                    .vertices;
                let text = word.symbols.into_iter().map(|s| s.text).collect();
                words.push(Word {
                    id,
                    text,
                    bounding_box,
                });
            }
        }
    }

    Ok(OcrResult {
        detected_language,
        words,
    })
}

/// First language in provider order; confidence values do not reorder it
fn top_language(languages: Vec<DetectedLanguage>) -> Result<String, OcrError> {
    languages
        .into_iter()
        .next()
        .map(|l| l.language_code)
        .ok_or_else(|| OcrError::Format("detectedLanguages is empty".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn word(text: &str, x: i32) -> serde_json::Value {
        let symbols: Vec<_> = text
            .chars()
            .map(|c| json!({ "text": c.to_string() }))
            .collect();
        json!({
            "boundingBox": { "vertices": [
                { "x": x, "y": 10 }, { "x": x + 20, "y": 10 },
                { "x": x + 20, "y": 30 }, { "x": x, "y": 30 }
            ]},
            "symbols": symbols
        })
    }

    fn response(languages: serde_json::Value, blocks: serde_json::Value) -> String {
        json!({
            "responses": [{
                "fullTextAnnotation": {
                    "pages": [{
                        "property": { "detectedLanguages": languages },
                        "blocks": blocks
                    }],
                    "text": "ignored"
                }
            }]
        })
        .to_string()
    }

    #[test]
    fn test_parses_words_in_traversal_order() {
        let body = response(
            json!([{ "languageCode": "en" }]),
            json!([
                { "blockType": "TEXT", "paragraphs": [
                    { "words": [word("Hi", 0), word("there", 30)] },
                    { "words": [word("Game", 0)] }
                ]},
                { "blockType": "TABLE", "paragraphs": [
                    { "words": [word("HP", 100)] }
                ]}
            ]),
        );

        let result = parse_annotation(&body).expect("Failed to parse");
        assert_eq!(result.detected_language, "en");
        let texts: Vec<_> = result.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, ["Hi", "there", "Game", "HP"]);
        let ids: Vec<_> = result.words.iter().map(|w| w.id).collect();
        assert_eq!(ids, [0, 1, 2, 3]);
    }

    #[test]
    fn test_copies_bounding_box_verbatim() {
        let body = response(
            json!([{ "languageCode": "en" }]),
            json!([{ "blockType": "TEXT", "paragraphs": [{ "words": [word("A", 5)] }] }]),
        );
        let result = parse_annotation(&body).unwrap();
        assert_eq!(
            result.words[0].bounding_box,
            vec![
                Vertex { x: 5, y: 10 },
                Vertex { x: 25, y: 10 },
                Vertex { x: 25, y: 30 },
                Vertex { x: 5, y: 30 },
            ]
        );
    }

    #[test]
    fn test_omitted_vertex_coordinates_default_to_zero() {
        let body = response(
            json!([{ "languageCode": "en" }]),
            json!([{ "blockType": "TEXT", "paragraphs": [{ "words": [{
                "boundingBox": { "vertices": [{}, { "x": 4 }, { "x": 4, "y": 2 }, { "y": 2 }] },
                "symbols": [{ "text": "o" }]
            }]}]}]),
        );
        let result = parse_annotation(&body).unwrap();
        assert_eq!(result.words[0].bounding_box[0], Vertex { x: 0, y: 0 });
        assert_eq!(result.words[0].bounding_box[3], Vertex { x: 0, y: 2 });
    }

    #[test]
    fn test_non_text_blocks_contribute_nothing() {
        let body = response(
            json!([{ "languageCode": "en" }]),
            json!([
                { "blockType": "PICTURE", "paragraphs": [{ "words": [word("logo", 0)] }] },
                { "blockType": "TEXT", "paragraphs": [{ "words": [word("Start", 0)] }] },
                { "blockType": "BARCODE", "paragraphs": [{ "words": [word("123", 0)] }] },
                { "paragraphs": [{ "words": [word("untyped", 0)] }] }
            ]),
        );
        let result = parse_annotation(&body).unwrap();
        assert_eq!(result.words.len(), 1);
        assert_eq!(result.words[0].text, "Start");
        assert_eq!(result.words[0].id, 0);
    }

    #[test]
    fn test_first_listed_language_wins_over_confidence() {
        let body = response(
            json!([
                { "languageCode": "ja", "confidence": 0.3 },
                { "languageCode": "en", "confidence": 0.9 }
            ]),
            json!([]),
        );
        assert_eq!(parse_annotation(&body).unwrap().detected_language, "ja");
    }

    #[test]
    fn test_language_ties_keep_provider_order() {
        let body = response(
            json!([{ "languageCode": "de" }, { "languageCode": "fr" }]),
            json!([]),
        );
        assert_eq!(parse_annotation(&body).unwrap().detected_language, "de");
    }

    #[test]
    fn test_missing_structure_is_a_format_error() {
        let cases = [
            json!({}).to_string(),
            json!({ "responses": [] }).to_string(),
            json!({ "responses": [{}] }).to_string(),
            json!({ "responses": [{ "fullTextAnnotation": {} }] }).to_string(),
            json!({ "responses": [{ "fullTextAnnotation": { "pages": [] } }] }).to_string(),
            json!({ "responses": [{ "fullTextAnnotation": { "pages": [{ "blocks": [] }] } }] })
                .to_string(),
            response(json!([]), json!([])),
            "not json".to_string(),
        ];
        for body in cases {
            let err = parse_annotation(&body).unwrap_err();
            assert!(matches!(err, OcrError::Format(_)), "{body}: {err}");
        }
    }

    #[test]
    fn test_word_without_bounding_box_is_rejected() {
        let body = response(
            json!([{ "languageCode": "en" }]),
            json!([{ "blockType": "TEXT", "paragraphs": [{ "words": [{ "symbols": [{ "text": "x" }] }] }] }]),
        );
        assert!(matches!(
            parse_annotation(&body).unwrap_err(),
            OcrError::Format(_)
        ));
    }

    #[test]
    fn test_embedded_provider_error_is_reported() {
        let body = json!({
            "responses": [{ "error": { "code": 3, "message": "Bad image data." } }]
        })
        .to_string();
        match parse_annotation(&body).unwrap_err() {
            OcrError::Provider { status, body } => {
                assert_eq!(status, 3);
                assert_eq!(body, "Bad image data.");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
