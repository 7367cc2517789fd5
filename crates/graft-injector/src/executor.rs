//! Isolated execution of script and stylesheet payloads.
//!
//! Every extension gets its own world: a separate Boa context whose globals
//! are limited to what the document exposes (`location`, `document`,
//! `console`). A payload is compiled as the body of an anonymous function and
//! receives the capability object as its only parameter, `chrome`. Nothing
//! from the host program is reachable from script.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{
    Context, JsError, JsObject, JsResult, JsString, JsValue, NativeFunction, Source, js_string,
};
use graft_core::{DocumentUrl, ExtensionId, LifecyclePhase};
use regex::{Captures, Regex};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::capability::CapabilityContext;
use crate::document::{Document, StyleElement};
use crate::error::{ExecutionError, ExecutionResult};

/// Lines the wrapper header adds ahead of the payload text.
pub const WRAPPER_LINE_OFFSET: usize = 1;

pub use graft_telemetry::CONSOLE_TARGET;

static LINE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bline (\d+)").expect("invalid regex"));

/// Wrap payload code as an anonymous function taking the capability object.
#[must_use]
pub fn wrap_payload(code: &str) -> String {
    format!("(function (chrome) {{\n{code}\n}})")
}

/// Shift line numbers in an engine diagnostic back onto the payload text.
#[must_use]
pub fn rebase_line_numbers(message: &str) -> String {
    LINE_NUMBER
        .replace_all(message, |caps: &Captures<'_>| {
            let line = caps[1]
                .parse::<usize>()
                .map_or(caps[1].to_string(), |n| {
                    n.saturating_sub(WRAPPER_LINE_OFFSET).max(1).to_string()
                });
            format!("line {line}")
        })
        .into_owned()
}

/// Runs payloads for one document.
pub struct IsolatedExecutor {
    document: Document,
    worlds: BTreeMap<ExtensionId, World>,
}

impl IsolatedExecutor {
    /// Create an executor for the document at `url`.
    #[must_use]
    pub fn new(url: DocumentUrl) -> Self {
        Self {
            document: Document::new(url),
            worlds: BTreeMap::new(),
        }
    }

    /// The document payloads run against.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Number of isolated worlds created so far.
    #[must_use]
    pub fn world_count(&self) -> usize {
        self.worlds.len()
    }

    /// Compile and run a script payload in the extension's world.
    ///
    /// Returns the value the payload body `return`s, as JSON. A body that
    /// returns nothing yields `null`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::Compile`] if the payload does not parse and
    /// [`ExecutionError::Runtime`] if it throws or returns a value that cannot
    /// be represented as JSON.
    pub fn run_script(
        &mut self,
        extension_id: &ExtensionId,
        source_id: &str,
        code: &str,
        capability: &CapabilityContext,
    ) -> ExecutionResult<Value> {
        let span = tracing::debug_span!("run_script", extension = %extension_id, source = %source_id);
        let _enter = span.enter();

        let world = self.world(extension_id, source_id)?;
        let context = &mut world.context;

        let wrapped = wrap_payload(code);
        let source = Source::from_bytes(wrapped.as_bytes()).with_path(Path::new(source_id));
        let compiled = context.eval(source).map_err(|e| ExecutionError::Compile {
            source_id: source_id.to_string(),
            message: rebase_line_numbers(&describe(&e, context)),
        })?;
        let Some(function) = compiled.as_callable().cloned() else {
            return Err(ExecutionError::Compile {
                source_id: source_id.to_string(),
                message: "payload did not compile to a function".into(),
            });
        };

        let chrome = JsValue::from_json(capability.as_json(), context)
            .map_err(|e| runtime_error(source_id, &e, context))?;
        let result = function
            .call(&JsValue::undefined(), &[chrome], context)
            .map_err(|e| runtime_error(source_id, &e, context))?;

        if result.is_undefined() {
            return Ok(Value::Null);
        }
        result.to_json(context).map_err(|e| ExecutionError::Runtime {
            source_id: source_id.to_string(),
            message: format!("result is not serializable: {}", describe(&e, context)),
        })
    }

    /// Queue a stylesheet payload for insertion into the document head.
    ///
    /// The code is never evaluated. The style element is appended once the
    /// DOM is ready (see [`flush_styles`](Self::flush_styles)).
    pub fn run_stylesheet(&mut self, source_id: &str, code: &str) {
        debug!(source = %source_id, "Queueing stylesheet until DOM is ready");
        self.document.queue_style(StyleElement {
            source_id: source_id.to_string(),
            text: code.to_string(),
        });
    }

    /// Append queued styles if the DOM is ready. Returns how many were appended.
    pub fn flush_styles(&mut self) -> usize {
        self.document.flush_styles()
    }

    /// Move the document to `phase` and update `document.readyState` in every
    /// world.
    pub fn enter_phase(&mut self, phase: LifecyclePhase) {
        self.document.enter(phase);
        let state = self.document.ready_state();
        for (extension_id, world) in &mut self.worlds {
            if let Err(e) = world.set_ready_state(state) {
                warn!(extension = %extension_id, error = %e, "Failed to update readyState");
            }
        }
    }

    fn world(&mut self, extension_id: &ExtensionId, source_id: &str) -> ExecutionResult<&mut World> {
        match self.worlds.entry(extension_id.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let world = World::new(&self.document).map_err(|e| ExecutionError::Runtime {
                    source_id: source_id.to_string(),
                    message: format!("failed to create isolated world: {e}"),
                })?;
                debug!(extension = %extension_id, "Created isolated world");
                Ok(entry.insert(world))
            },
        }
    }
}

impl fmt::Debug for IsolatedExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsolatedExecutor")
            .field("document", &self.document)
            .field("worlds", &self.worlds.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// One extension's script context within the document.
struct World {
    context: Context,
    document: JsObject,
}

impl World {
    fn new(document: &Document) -> JsResult<Self> {
        let mut context = Context::default();
        let url = document.url();

        let location = ObjectInitializer::new(&mut context)
            .property(js_string!("href"), JsString::from(url.href()), Attribute::all())
            .property(js_string!("protocol"), JsString::from(url.protocol().as_str()), Attribute::all())
            .property(js_string!("host"), JsString::from(url.host().as_str()), Attribute::all())
            .property(js_string!("hostname"), JsString::from(url.hostname()), Attribute::all())
            .property(js_string!("pathname"), JsString::from(url.pathname()), Attribute::all())
            .property(js_string!("search"), JsString::from(url.search().as_str()), Attribute::all())
            .property(js_string!("hash"), JsString::from(url.hash().as_str()), Attribute::all())
            .build();
        context.register_global_property(js_string!("location"), location, Attribute::all())?;

        let dom = ObjectInitializer::new(&mut context)
            .property(js_string!("URL"), JsString::from(url.href()), Attribute::all())
            .property(
                js_string!("readyState"),
                JsString::from(document.ready_state()),
                Attribute::all(),
            )
            .build();
        context.register_global_property(js_string!("document"), dom.clone(), Attribute::all())?;

        let console = ObjectInitializer::new(&mut context)
            .function(NativeFunction::from_fn_ptr(console_log), js_string!("log"), 0)
            .function(NativeFunction::from_fn_ptr(console_log), js_string!("info"), 0)
            .function(NativeFunction::from_fn_ptr(console_debug), js_string!("debug"), 0)
            .function(NativeFunction::from_fn_ptr(console_warn), js_string!("warn"), 0)
            .function(NativeFunction::from_fn_ptr(console_error), js_string!("error"), 0)
            .build();
        context.register_global_property(js_string!("console"), console, Attribute::all())?;

        Ok(Self {
            context,
            document: dom,
        })
    }

    fn set_ready_state(&mut self, state: &str) -> JsResult<()> {
        self.document.set(
            js_string!("readyState"),
            JsString::from(state),
            false,
            &mut self.context,
        )?;
        Ok(())
    }
}

fn describe(err: &JsError, context: &mut Context) -> String {
    err.try_native(context)
        .map_or_else(|_| err.to_string(), |native| native.to_string())
}

fn runtime_error(source_id: &str, err: &JsError, context: &mut Context) -> ExecutionError {
    ExecutionError::Runtime {
        source_id: source_id.to_string(),
        message: describe(err, context),
    }
}

fn console_message(args: &[JsValue], context: &mut Context) -> JsResult<String> {
    let mut parts = Vec::with_capacity(args.len());
    for arg in args {
        parts.push(arg.to_string(context)?.to_std_string_escaped());
    }
    Ok(parts.join(" "))
}

fn console_log(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let message = console_message(args, context)?;
    info!(target: CONSOLE_TARGET, %message, "console");
    Ok(JsValue::undefined())
}

fn console_debug(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let message = console_message(args, context)?;
    debug!(target: CONSOLE_TARGET, %message, "console");
    Ok(JsValue::undefined())
}

fn console_warn(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let message = console_message(args, context)?;
    warn!(target: CONSOLE_TARGET, %message, "console");
    Ok(JsValue::undefined())
}

fn console_error(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let message = console_message(args, context)?;
    error!(target: CONSOLE_TARGET, %message, "console");
    Ok(JsValue::undefined())
}
