//! Backend on libxslt, which compiles each stylesheet before applying it.
//!
//! libxslt keeps extension functions in a process-wide registry, so the date
//! functions are registered once, on first use. While a transformation runs,
//! the callbacks find that call's [`Extensions`] through a thread-local: the
//! engine invokes them on the thread that called [`Backend::run`].
//! Callbacks receive typed XPath objects: numbers, strings, or node-sets,
//! of which the first node's string value is used.

use std::cell::Cell;
use std::ffi::{CStr, c_int};
use std::marker::PhantomData;
use std::ptr;
use std::sync::Once;

use exn::ResultExt;
use libxslt::bindings as ffi;

use super::{Backend, BackendKind};
use crate::error::{ErrorKind, Result};
use crate::functions::{DateFunction, Extensions, RecordRef};

/// Same as [`crate::functions::FUNCTION_NAMESPACE`].
const NAMESPACE: &CStr = c"http://cdsweb.cern.ch/bibformat/fn";

const PARSE_OPTIONS: c_int = (ffi::xmlParserOption_XML_PARSE_NOERROR
    | ffi::xmlParserOption_XML_PARSE_NOWARNING
    | ffi::xmlParserOption_XML_PARSE_NONET) as c_int;

#[derive(Debug, Clone, Copy, Default)]
pub struct CompiledBackend;

impl Backend for CompiledBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Compiled
    }

    fn run(&self, source: &str, template: &str, extensions: &Extensions) -> Result<String> {
        initialize();
        let stylesheet = Stylesheet::compile(XmlDoc::parse(template)?)?;
        let document = XmlDoc::parse(source)?;
        let _bound = BoundExtensions::bind(extensions);
        let result = stylesheet.apply(&document)?;
        stylesheet.serialize(&result)
    }
}

fn initialize() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        // SAFETY: runs once, before any document is parsed or stylesheet applied.
        unsafe {
            ffi::xmlInitParser();
            ffi::xsltInit();
        }
        libxslt::register_exslt();
        for function in DateFunction::ALL {
            let callback: ffi::xmlXPathFunction = match function {
                DateFunction::Creation => Some(creation_date),
                DateFunction::Modification => Some(modification_date),
            };
            // SAFETY: libxslt copies both names into its registry.
            let status = unsafe {
                ffi::xsltRegisterExtModuleFunction(c_name(function).as_ptr().cast(), NAMESPACE.as_ptr().cast(), callback)
            };
            if status != 0 {
                tracing::error!(function = function.name(), "could not register extension function");
            }
        }
        tracing::debug!("libxslt initialized");
    });
}

fn c_name(function: DateFunction) -> &'static CStr {
    match function {
        DateFunction::Creation => c"creation_date",
        DateFunction::Modification => c"modification_date",
    }
}

thread_local! {
    static EXTENSIONS: Cell<*const Extensions> = const { Cell::new(ptr::null()) };
}

/// Makes `extensions` visible to the callbacks until dropped.
struct BoundExtensions<'a> {
    previous: *const Extensions,
    _extensions: PhantomData<&'a Extensions>,
}

impl<'a> BoundExtensions<'a> {
    fn bind(extensions: &'a Extensions) -> Self {
        let previous = EXTENSIONS.replace(extensions);
        Self { previous, _extensions: PhantomData }
    }
}

impl Drop for BoundExtensions<'_> {
    fn drop(&mut self) {
        EXTENSIONS.set(self.previous);
    }
}

unsafe extern "C" fn creation_date(ctxt: ffi::xmlXPathParserContextPtr, nargs: c_int) {
    // SAFETY: called by libxslt with a live parser context.
    unsafe { call(DateFunction::Creation, ctxt, nargs) }
}

unsafe extern "C" fn modification_date(ctxt: ffi::xmlXPathParserContextPtr, nargs: c_int) {
    // SAFETY: called by libxslt with a live parser context.
    unsafe { call(DateFunction::Modification, ctxt, nargs) }
}

/// Pops the arguments, looks the date up and pushes it as the result.
///
/// Never reports an error to libxslt: a failed lookup evaluates to "".
unsafe fn call(function: DateFunction, ctxt: ffi::xmlXPathParserContextPtr, nargs: c_int) {
    let mut record = RecordRef::Missing;
    // Popped last to first, so the record ends up holding the first argument.
    for _ in 0..nargs {
        // SAFETY: libxslt pushed `nargs` objects for this call.
        let object = unsafe { ffi::valuePop(ctxt) };
        if !object.is_null() {
            // SAFETY: popped objects belong to the callee.
            unsafe {
                record = record_ref(object);
                ffi::xmlXPathFreeObject(object);
            }
        }
    }
    let date = EXTENSIONS.with(|bound| {
        let extensions = bound.get();
        if extensions.is_null() {
            tracing::warn!(function = function.name(), "extension function called outside of a transformation");
            return String::new();
        }
        // SAFETY: `BoundExtensions` keeps the pointee alive while it is set.
        unsafe { &*extensions }.evaluate(function, &record)
    });
    // Dates never contain NUL; should one appear, the result is cut there.
    let date: Vec<u8> = date.into_bytes().into_iter().take_while(|&byte| byte != 0).chain([0]).collect();
    // SAFETY: `xmlXPathNewString` copies the NUL-terminated string.
    unsafe { ffi::valuePush(ctxt, ffi::xmlXPathNewString(date.as_ptr())) };
}

/// # Safety
/// `object` must point to a live XPath object.
unsafe fn record_ref(object: ffi::xmlXPathObjectPtr) -> RecordRef {
    // SAFETY: guaranteed by the caller.
    let value = unsafe { &*object };
    match value.type_ {
        ffi::xmlXPathObjectType_XPATH_NUMBER if value.floatval.is_finite() && value.floatval.fract() == 0.0 => {
            RecordRef::Integer(value.floatval as i64)
        },
        ffi::xmlXPathObjectType_XPATH_NODESET | ffi::xmlXPathObjectType_XPATH_XSLT_TREE => {
            let nodes = value.nodesetval;
            // SAFETY: a non-empty node-set holds `nodeNr` valid node pointers.
            unsafe {
                if nodes.is_null() || (*nodes).nodeNr == 0 {
                    return RecordRef::Node(None);
                }
                RecordRef::Node(take_string(ffi::xmlXPathCastNodeToString(*(*nodes).nodeTab)))
            }
        },
        // SAFETY: casting allocates a fresh string, which `take_string` frees.
        _ => RecordRef::Text(unsafe { take_string(ffi::xmlXPathCastToString(object)) }.unwrap_or_default()),
    }
}

/// Copies and frees a NUL-terminated string allocated by libxml2.
///
/// # Safety
/// `string` must be null or an owned libxml2 allocation.
unsafe fn take_string(string: *mut ffi::xmlChar) -> Option<String> {
    if string.is_null() {
        return None;
    }
    // SAFETY: guaranteed by the caller.
    unsafe {
        let copy = CStr::from_ptr(string.cast()).to_string_lossy().into_owned();
        libc::free(string.cast());
        Some(copy)
    }
}

/// The message of the last libxml2 error on this thread.
fn last_error(fallback: &str) -> String {
    // SAFETY: the last error is thread-local and lives until the next reset.
    unsafe {
        let error = ffi::xmlGetLastError();
        if error.is_null() || (*error).message.is_null() {
            return fallback.to_string();
        }
        CStr::from_ptr((*error).message).to_string_lossy().trim_end().to_string()
    }
}

/// A parsed document, freed on drop.
struct XmlDoc(ffi::xmlDocPtr);

impl XmlDoc {
    fn parse(xml: &str) -> Result<Self> {
        let size = c_int::try_from(xml.len()).or_raise(|| ErrorKind::MalformedXml("document too large".to_string()))?;
        // SAFETY: the buffer outlives the call; libxml2 copies what it keeps.
        let doc = unsafe {
            ffi::xmlResetLastError();
            ffi::xmlReadMemory(xml.as_ptr().cast(), size, ptr::null(), ptr::null(), PARSE_OPTIONS)
        };
        if doc.is_null() {
            exn::bail!(ErrorKind::MalformedXml(last_error("document could not be parsed")));
        }
        Ok(Self(doc))
    }

    /// Hands ownership to libxslt.
    fn into_raw(self) -> ffi::xmlDocPtr {
        let doc = self.0;
        std::mem::forget(self);
        doc
    }
}

impl Drop for XmlDoc {
    fn drop(&mut self) {
        // SAFETY: the document is owned and freed exactly once.
        unsafe { ffi::xmlFreeDoc(self.0) }
    }
}

/// A compiled stylesheet. Owns the document it was compiled from.
struct Stylesheet(ffi::xsltStylesheetPtr);

impl Stylesheet {
    fn compile(doc: XmlDoc) -> Result<Self> {
        // SAFETY: on failure libxslt leaves the document to the caller, which
        // `doc` frees when dropped.
        let style = unsafe {
            ffi::xmlResetLastError();
            ffi::xsltParseStylesheetDoc(doc.0)
        };
        if style.is_null() {
            exn::bail!(ErrorKind::InvalidStylesheet(last_error("not a usable XSLT stylesheet")));
        }
        doc.into_raw();
        Ok(Self(style))
    }

    fn apply(&self, document: &XmlDoc) -> Result<XmlDoc> {
        let context = TransformContext::new(self, document)?;
        // SAFETY: stylesheet, document and context stay alive for the call.
        let result = unsafe {
            ffi::xsltApplyStylesheetUser(
                self.0,
                document.0,
                ptr::null_mut(),
                ptr::null(),
                ptr::null_mut(),
                context.0,
            )
        };
        let result = (!result.is_null()).then_some(XmlDoc(result));
        // SAFETY: the context is live until dropped below.
        let state = unsafe { (*context.0).state };
        match result {
            Some(result) if state == ffi::xsltTransformState_XSLT_STATE_OK => Ok(result),
            _ if state == ffi::xsltTransformState_XSLT_STATE_STOPPED => {
                exn::bail!(ErrorKind::Transform("terminated by the stylesheet".to_string()))
            },
            _ => exn::bail!(ErrorKind::Transform(last_error("stylesheet could not be applied"))),
        }
    }

    /// Serializes `result` as the stylesheet's `xsl:output` asks.
    fn serialize(&self, result: &XmlDoc) -> Result<String> {
        let mut buffer: *mut ffi::xmlChar = ptr::null_mut();
        let mut length: c_int = 0;
        // SAFETY: libxslt allocates the buffer, which is freed below.
        let status = unsafe { ffi::xsltSaveResultToString(&mut buffer, &mut length, result.0, self.0) };
        if status != 0 {
            exn::bail!(ErrorKind::Transform("result could not be serialized".to_string()));
        }
        if buffer.is_null() {
            return Ok(String::new());
        }
        // SAFETY: `buffer` holds `length` bytes.
        let output = unsafe {
            let bytes = std::slice::from_raw_parts(buffer, usize::try_from(length).unwrap_or_default());
            let output = String::from_utf8_lossy(bytes).into_owned();
            libc::free(buffer.cast());
            output
        };
        Ok(output)
    }
}

impl Drop for Stylesheet {
    fn drop(&mut self) {
        // SAFETY: frees the stylesheet and the document it owns, once.
        unsafe { ffi::xsltFreeStylesheet(self.0) }
    }
}

struct TransformContext(ffi::xsltTransformContextPtr);

impl TransformContext {
    fn new(stylesheet: &Stylesheet, document: &XmlDoc) -> Result<Self> {
        // SAFETY: both pointers are live.
        let context = unsafe { ffi::xsltNewTransformContext(stylesheet.0, document.0) };
        if context.is_null() {
            exn::bail!(ErrorKind::Transform("could not create a transformation context".to_string()));
        }
        Ok(Self(context))
    }
}

impl Drop for TransformContext {
    fn drop(&mut self) {
        // SAFETY: the context is owned and freed exactly once.
        unsafe { ffi::xsltFreeTransformContext(self.0) }
    }
}
