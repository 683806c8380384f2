use hger_core::core_api::{Engine, GameTables, OpenOptions};
use hger_core::crypto::ShuffleResolver;
use hger_core::text::CharTable;
use hger_render::{JsonStyle, render_json_full, render_text};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WebRenderOptions {
    pub json_output: bool,
    /// Contents of a `charmap.txt`; the basic-Latin table is used when absent.
    pub charmap: Option<String>,
    pub heuristic_shuffle: bool,
}

#[derive(Debug, Clone)]
struct WebError {
    code: &'static str,
    message: String,
}

#[derive(Debug, Clone, Serialize)]
struct WebErrorPayload {
    code: String,
    message: String,
}

impl WebError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn to_js_value(&self) -> JsValue {
        let payload = WebErrorPayload {
            code: self.code.to_string(),
            message: self.message.clone(),
        };
        serde_wasm_bindgen::to_value(&payload).unwrap_or_else(|_| {
            JsValue::from_str(&format!("{}: {}", payload.code, payload.message))
        })
    }
}

#[wasm_bindgen]
pub fn render_save_text(save_bytes: &[u8], options: JsValue) -> Result<String, JsValue> {
    let parsed_options = parse_options(options).map_err(|err| err.to_js_value())?;
    render_save_text_impl(save_bytes, &parsed_options).map_err(|err| err.to_js_value())
}

fn render_save_text_impl(
    save_bytes: &[u8],
    options: &WebRenderOptions,
) -> Result<String, WebError> {
    if save_bytes.is_empty() {
        return Err(WebError::new(
            "unsupported_file",
            "The uploaded file is empty. Please provide a .sav file.",
        ));
    }

    let tables = tables_for(options.charmap.as_deref())?;
    let open_options = OpenOptions {
        resolver: if options.heuristic_shuffle {
            ShuffleResolver::Heuristic
        } else {
            ShuffleResolver::Fixed
        },
    };
    let session = Engine::new(tables)
        .open_bytes(save_bytes, open_options)
        .map_err(|err| WebError::new("unsupported_file", err.to_string()))?;

    if options.json_output {
        let value = render_json_full(&session, JsonStyle::CanonicalV1);
        return serde_json::to_string_pretty(&value).map_err(|err| {
            WebError::new(
                "render_failed",
                format!("failed to serialize rendered JSON output: {err}"),
            )
        });
    }

    Ok(render_text(&session))
}

fn tables_for(charmap: Option<&str>) -> Result<GameTables, WebError> {
    let Some(text) = charmap else {
        return Ok(GameTables::default());
    };
    let chars = CharTable::parse(text);
    if chars.is_empty() {
        return Err(WebError::new(
            "invalid_options",
            "charmap contains no usable entries",
        ));
    }
    Ok(GameTables::default().with_chars(chars))
}

fn parse_options(options: JsValue) -> Result<WebRenderOptions, WebError> {
    if options.is_null() || options.is_undefined() {
        return Ok(WebRenderOptions::default());
    }

    serde_wasm_bindgen::from_value(options).map_err(|err| {
        WebError::new(
            "invalid_options",
            format!("Failed to parse web render options: {err}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::{WebRenderOptions, render_save_text_impl, tables_for};

    #[test]
    fn render_save_text_impl_rejects_empty_payload() {
        let err = render_save_text_impl(&[], &WebRenderOptions::default())
            .expect_err("empty payload should fail");
        assert_eq!(err.code, "unsupported_file");
    }

    #[test]
    fn blank_image_renders_a_trainer_card() {
        let rendered = render_save_text_impl(&[0u8; 0x400], &WebRenderOptions::default())
            .expect("blank image should render");
        assert!(rendered.starts_with("Trainer:"));
        assert!(rendered.contains("GeneralBlockFallback"));
    }

    #[test]
    fn json_output_is_an_object() {
        let options = WebRenderOptions {
            json_output: true,
            ..WebRenderOptions::default()
        };
        let rendered =
            render_save_text_impl(&[0u8; 0x400], &options).expect("blank image should render");
        let value: serde_json::Value =
            serde_json::from_str(&rendered).expect("output should be JSON");
        assert_eq!(value["party_count"], 0);
    }

    #[test]
    fn unusable_charmap_is_an_options_error() {
        let err = tables_for(Some("// nothing here\n")).expect_err("empty charmap");
        assert_eq!(err.code, "invalid_options");
        let tables = tables_for(Some("0121=0\n")).expect("one entry");
        assert_eq!(tables.chars().len(), 1);
    }
}
