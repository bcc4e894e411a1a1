//! Boundary between adapters and the vendor SDK living in the host page
//!
//! Adapters describe every vendor draw command as a [`VendorCall`]; a
//! [`VendorHost`] executes it (through a JS bridge in a browser, or by
//! recording it in tests and headless runs).

use crate::{MapError, Result};
use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// A single vendor API invocation: `target.method(...args)`
///
/// Conventions understood by every host bridge:
/// * `method == "new"` constructs `new target(...args)`;
/// * a method starting with `=` assigns `args[0]` to that property of `target`;
/// * `bind` stores the call's result under that name for later calls;
/// * `{"$ref": name}` in an argument refers to a bound object and
///   `{"$element": id}` to the DOM element with that id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorCall {
    pub target: String,
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
}

impl VendorCall {
    pub fn new(target: impl Into<String>, method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            target: target.into(),
            method: method.into(),
            args,
            bind: None,
        }
    }

    /// `new class(...args)`
    pub fn construct(class: impl Into<String>, args: Vec<Value>) -> Self {
        Self::new(class, "new", args)
    }

    /// `target.property = value`
    pub fn assign(target: impl Into<String>, property: &str, value: Value) -> Self {
        Self::new(target, format!("={property}"), vec![value])
    }

    /// Binds the result to `name`
    pub fn bind(mut self, name: impl Into<String>) -> Self {
        self.bind = Some(name.into());
        self
    }

    pub fn is(&self, target: &str, method: &str) -> bool {
        self.target == target && self.method == method
    }
}

/// Argument referring to an object bound by an earlier call
pub fn object_ref(name: &str) -> Value {
    json!({ "$ref": name })
}

/// Argument referring to a DOM element of the host page
pub fn element_ref(id: &str) -> Value {
    json!({ "$element": id })
}

impl std::fmt::Display for VendorCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let args: Vec<String> = self.args.iter().map(Value::to_string).collect();
        if let Some(bind) = &self.bind {
            write!(f, "{bind} = ")?;
        }
        match self.method.as_str() {
            "new" => write!(f, "new {}({})", self.target, args.join(", ")),
            m if m.starts_with('=') => write!(f, "{}.{} = {}", self.target, &m[1..], args.join(", ")),
            m => write!(f, "{}.{}({})", self.target, m, args.join(", ")),
        }
    }
}

/// Executes vendor calls and exposes the SDK's global state
pub trait VendorHost: Send {
    /// Appends the SDK script to the page. A failure here is not fatal by
    /// itself: the readiness probe simply never succeeds.
    fn load_script(&mut self, url: &str) -> Result<()>;

    /// Whether the dotted global path (e.g. `google.maps`) is populated
    fn has_global(&self, path: &str) -> bool;

    /// Performs one vendor call
    fn call(&mut self, call: VendorCall) -> Result<()>;
}

#[derive(Debug, Default)]
struct Recording {
    calls: Vec<VendorCall>,
    scripts: Vec<String>,
    /// Remaining failed probes before a global becomes available
    globals: HashMap<String, u32>,
    probes: u32,
    fail_calls: bool,
    /// Methods rejected even when other calls succeed
    fail_methods: HashSet<String>,
}

/// Host that records every call. Clones share the same recording.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    inner: Arc<Mutex<Recording>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `path` available from the first probe on
    pub fn with_global(self, path: &str) -> Self {
        self.ready_after(path, 0)
    }

    /// Makes `path` available once `failed_probes` probes have missed it
    pub fn ready_after(self, path: &str, failed_probes: u32) -> Self {
        if let Ok(mut rec) = self.inner.lock() {
            rec.globals.insert(path.to_string(), failed_probes);
        }
        self
    }

    /// Every vendor call fails with a host error
    pub fn failing(self) -> Self {
        if let Ok(mut rec) = self.inner.lock() {
            rec.fail_calls = true;
        }
        self
    }

    /// Calls to `method`, on any target, fail with a host error
    pub fn fail_on(self, method: &str) -> Self {
        if let Ok(mut rec) = self.inner.lock() {
            rec.fail_methods.insert(method.to_string());
        }
        self
    }

    /// Lets every call through again
    pub fn recover(&self) {
        if let Ok(mut rec) = self.inner.lock() {
            rec.fail_calls = false;
            rec.fail_methods.clear();
        }
    }

    pub fn calls(&self) -> Vec<VendorCall> {
        self.inner
            .lock()
            .map(|rec| rec.calls.clone())
            .unwrap_or_default()
    }

    pub fn scripts(&self) -> Vec<String> {
        self.inner
            .lock()
            .map(|rec| rec.scripts.clone())
            .unwrap_or_default()
    }

    pub fn probes(&self) -> u32 {
        self.inner.lock().map(|rec| rec.probes).unwrap_or(0)
    }

    /// Calls matching `target.method`
    pub fn calls_to(&self, target: &str, method: &str) -> Vec<VendorCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.is(target, method))
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut rec) = self.inner.lock() {
            rec.calls.clear();
        }
    }
}

impl VendorHost for RecordingHost {
    fn load_script(&mut self, url: &str) -> Result<()> {
        let mut rec = self
            .inner
            .lock()
            .map_err(|_| MapError::Host("recording poisoned".to_string()))?;
        rec.scripts.push(url.to_string());
        Ok(())
    }

    fn has_global(&self, path: &str) -> bool {
        let Ok(mut rec) = self.inner.lock() else {
            return false;
        };
        rec.probes += 1;
        match rec.globals.get_mut(path) {
            Some(0) => true,
            Some(remaining) => {
                *remaining -= 1;
                false
            }
            None => false,
        }
    }

    fn call(&mut self, call: VendorCall) -> Result<()> {
        let mut rec = self
            .inner
            .lock()
            .map_err(|_| MapError::Host("recording poisoned".to_string()))?;
        if rec.fail_calls || rec.fail_methods.contains(&call.method) {
            return Err(MapError::Host(format!("{call} rejected")));
        }
        log::trace!("vendor call {call}");
        rec.calls.push(call);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_globals_become_ready_after_probes() {
        let host = RecordingHost::new().ready_after("L", 2);
        assert!(!host.has_global("L"));
        assert!(!host.has_global("L"));
        assert!(host.has_global("L"));
        assert!(!host.has_global("google.maps"));
        assert_eq!(host.probes(), 4);
    }

    #[test]
    fn test_clones_share_recording() {
        let host = RecordingHost::new();
        let mut writer = host.clone();
        writer
            .call(VendorCall::new("map", "setZoom", vec![json!(3)]))
            .unwrap();

        assert_eq!(host.calls_to("map", "setZoom").len(), 1);
        assert_eq!(host.calls()[0].to_string(), "map.setZoom(3)");
    }

    #[test]
    fn test_call_display_conventions() {
        let call = VendorCall::construct("L.Marker", vec![json!([1.0, 2.0])]).bind("marker-1");
        assert_eq!(call.to_string(), "marker-1 = new L.Marker([1.0,2.0])");

        let call = VendorCall::assign("mapboxgl", "accessToken", json!("pk"));
        assert_eq!(call.to_string(), "mapboxgl.accessToken = \"pk\"");
        assert_eq!(object_ref("map"), json!({"$ref": "map"}));
    }

    #[test]
    fn test_fail_on_rejects_one_method_until_recovered() {
        let mut host = RecordingHost::new().fail_on("bindPopup");
        assert!(host.call(VendorCall::new("marker-1", "addTo", vec![])).is_ok());
        assert!(host.call(VendorCall::new("marker-1", "bindPopup", vec![])).is_err());

        host.recover();
        assert!(host.call(VendorCall::new("marker-1", "bindPopup", vec![])).is_ok());
        assert_eq!(host.calls().len(), 2);
    }

    #[test]
    fn test_failing_host_rejects_calls() {
        let mut host = RecordingHost::new().failing();
        assert!(host.call(VendorCall::new("map", "remove", vec![])).is_err());
        assert!(host.calls().is_empty());
    }
}
