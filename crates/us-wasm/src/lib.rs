//! WebAssembly bindings for the userstyle converter

use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::prelude::*;

use us_compiler::{convert_userstyle as convert, ScriptMetadata};

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&message),
            Level::Warn => web_sys::console::warn_1(&message),
            Level::Info => web_sys::console::info_1(&message),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&message),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Forward converter logs to the browser console.
#[wasm_bindgen]
pub fn init_logging(verbose: bool) -> Result<(), JsValue> {
    log::set_logger(&LOGGER).map_err(|e| JsValue::from_str(&format!("Logger already set: {}", e)))?;
    log::set_max_level(if verbose { LevelFilter::Debug } else { LevelFilter::Warn });
    Ok(())
}

#[wasm_bindgen]
pub fn convert_userstyle(
    css: &str,
    name: Option<String>,
    author: Option<String>,
    homepage: Option<String>,
) -> Result<JsValue, JsValue> {
    let metadata = ScriptMetadata::new(
        name.as_deref().unwrap_or_default(),
        author.as_deref().unwrap_or_default(),
        homepage.as_deref().unwrap_or_default(),
    );

    let script = convert(css, &metadata).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let match_patterns = js_sys::Array::new();
    for pattern in script.match_patterns.patterns() {
        match_patterns.push(&JsValue::from_str(pattern));
    }

    let diagnostics = js_sys::Array::new();
    for diagnostic in &script.diagnostics {
        diagnostics.push(&JsValue::from_str(&diagnostic.to_string()));
    }

    let js_result = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&js_result, &"script".into(), &JsValue::from_str(&script.text));
    let _ = js_sys::Reflect::set(&js_result, &"matchPatterns".into(), &match_patterns);
    let _ = js_sys::Reflect::set(
        &js_result,
        &"runsEverywhere".into(),
        &JsValue::from(script.runs_everywhere()),
    );
    let _ = js_sys::Reflect::set(&js_result, &"diagnostics".into(), &diagnostics);

    Ok(js_result.into())
}
