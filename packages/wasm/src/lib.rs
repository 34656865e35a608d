//! WebAssembly bindings for the webppl-rsa library.
//!
//! Exposes one class, [`RsaSession`], to JavaScript via `wasm-bindgen`.
//! Compile with `wasm-pack build` and load the package from the WebPPL
//! package that hosts the model; each exported method maps onto one of the
//! library's by-name functions.
//!
//! ```js
//! import init, { RsaSession } from './webppl_rsa_wasm.js';
//! await init();
//!
//! const rsa = new RsaSession();                  // or new RsaSession('{"tablePadding":1}')
//! const speaker = rsa.getNewAgentId();          // 1
//! const words = JSON.parse(rsa.addAgentId('["blue","square"]', speaker));
//! // [{ value: "blue", agentId: 1 }, { value: "square", agentId: 1 }]
//!
//! rsa.store('agent', 'S1', rsa.mkAgent('{"name":"S1"}'));
//! console.log(rsa.get('agent', 'S1'));          // {"isAgent":true,"name":"S1"}
//! console.log(rsa.renderAsciiTable('[["a","bb"],["ccc","d"]]'));
//! ```
//!
//! Values cross the boundary as JSON text, so object identity does not
//! survive a round trip. Methods that take or return functions
//! (`nameFunction`, `applyFixedArity`) are therefore not exported; use the
//! Rust [`Host`] directly when function values are needed.

use wasm_bindgen::prelude::*;
use webppl_rsa::{Host, HostConfig, Value, AGENT_ID_PROP};

/// One-time initialisation called at the start of every exported function.
///
/// Installs the `console_error_panic_hook` when the feature is enabled so
/// that Rust panics are forwarded to the browser console as readable errors
/// rather than appearing as generic "unreachable" WASM traps.
fn setup() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Library state for one model run: an agent id counter and an object
/// registry.
///
/// Every method that can fail throws a string carrying the library's error
/// message (for example `"no objects of type agent"`).
#[wasm_bindgen]
pub struct RsaSession {
    host: Host,
}

#[wasm_bindgen]
impl RsaSession {
    /// Create a session. `options` is an optional JSON object:
    ///
    /// ```json
    /// { "agentIdOffset": 0, "tablePadding": 2 }
    /// ```
    ///
    /// Throws if the options are not valid JSON or contain unknown keys.
    #[wasm_bindgen(constructor)]
    pub fn new(options: Option<String>) -> Result<RsaSession, JsValue> {
        setup();
        let config = match options {
            Some(json) => HostConfig::from_json(&json)
                .map_err(|e| JsValue::from_str(&format!("options parse error: {e}")))?,
            None => HostConfig::default(),
        };
        Ok(Self {
            host: Host::new(config),
        })
    }

    /// Allocate the next agent id.
    #[wasm_bindgen(js_name = getNewAgentId)]
    pub fn get_new_agent_id(&mut self) -> Result<f64, JsValue> {
        let id = self.call("getNewAgentId", &[])?;
        id.as_number()
            .ok_or_else(|| JsValue::from_str("agent id is not a number"))
    }

    /// The most recently allocated id (the offset if none yet).
    #[wasm_bindgen(getter, js_name = lastAgentId)]
    pub fn last_agent_id(&self) -> f64 {
        self.host.agents().current() as f64
    }

    /// Tag every element of a JSON array with `agentId`.
    ///
    /// Objects come back with an `agentId` field. Strings and arrays cannot
    /// carry a field in JSON, so a tagged one comes back as
    /// `{ "value": …, "agentId": … }`. Numbers and booleans come back
    /// untagged.
    #[wasm_bindgen(js_name = addAgentId)]
    pub fn add_agent_id(&mut self, items_json: &str, id: f64) -> Result<String, JsValue> {
        let items = parse(items_json)?;
        let tagged = self.call("addAgentId", &[items, Value::Number(id)])?;
        let out: Vec<serde_json::Value> = tagged
            .array_items()
            .unwrap_or_default()
            .iter()
            .map(tagged_json)
            .collect();
        Ok(serde_json::Value::Array(out).to_string())
    }

    /// Store a JSON value under `(type_name, name)`, replacing any previous
    /// value.
    pub fn store(&mut self, type_name: &str, name: &str, value_json: &str) -> Result<(), JsValue> {
        let value = parse(value_json)?;
        self.call("store", &[type_name.into(), name.into(), value])?;
        Ok(())
    }

    /// The stored value as JSON. Throws if the type or the name is unknown.
    pub fn get(&mut self, type_name: &str, name: &str) -> Result<String, JsValue> {
        let value = self.call("get", &[type_name.into(), name.into()])?;
        Ok(value.to_json().to_string())
    }

    /// Every value stored under `type_name`, as a JSON object keyed by name.
    #[wasm_bindgen(js_name = getAll)]
    pub fn get_all(&mut self, type_name: &str) -> Result<String, JsValue> {
        let all = self.call("getAll", &[type_name.into()])?;
        Ok(all.to_json().to_string())
    }

    /// Zip a JSON key array with a JSON value array into an object, or wrap a
    /// single key and value.
    #[wasm_bindgen(js_name = makeObject)]
    pub fn make_object(&mut self, keys_json: &str, values_json: &str) -> Result<String, JsValue> {
        let keys = parse(keys_json)?;
        let values = parse(values_json)?;
        let obj = self.call("makeObject", &[keys, values])?;
        Ok(obj.to_json().to_string())
    }

    /// Throw `message` when `condition` is false.
    pub fn assert(&mut self, condition: bool, message: &str) -> Result<(), JsValue> {
        self.call("assert", &[Value::Bool(condition), message.into()])?;
        Ok(())
    }

    /// Render a JSON array of rows as a padded text table.
    #[wasm_bindgen(js_name = renderAsciiTable)]
    pub fn render_ascii_table(&mut self, rows_json: &str) -> Result<String, JsValue> {
        let rows = parse(rows_json)?;
        let table = self.call("renderAsciiTable", &[rows])?;
        Ok(table.to_display_string())
    }

    /// Flag a JSON object as an agent. Returns its display text, which is
    /// also its JSON.
    #[wasm_bindgen(js_name = mkAgent)]
    pub fn mk_agent(&mut self, fields_json: &str) -> Result<String, JsValue> {
        let fields = parse(fields_json)?;
        let agent = self.call("mkAgent", &[fields])?;
        Ok(agent.to_display_string())
    }
}

impl RsaSession {
    fn call(&mut self, function: &str, args: &[Value]) -> Result<Value, JsValue> {
        setup();
        self.host
            .call(function, args)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn parse(json: &str) -> Result<Value, JsValue> {
    let parsed: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| JsValue::from_str(&format!("parse error: {e}")))?;
    Ok(Value::from_json(parsed))
}

fn tagged_json(value: &Value) -> serde_json::Value {
    let json = value.to_json();
    match value.get_prop(AGENT_ID_PROP) {
        Value::Undefined => json,
        _ if json.is_object() => json,
        id => serde_json::json!({ "value": json, "agentId": id.to_json() }),
    }
}
