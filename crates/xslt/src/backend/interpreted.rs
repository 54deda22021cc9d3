//! Backend on xrust, which interprets the stylesheet tree on every run.
//!
//! xrust resolves calls to unknown functions against stylesheet-defined
//! functions and has no hook for native ones. Each date function is therefore
//! defined as a stylesheet function of one argument whose body reads the
//! document `bibformat:<function>?<argument>`; the backend's document fetcher
//! answers that URL with the looked-up date. The argument arrives as its
//! string value.

use std::rc::Rc;

use exn::OptionExt;
use percent_encoding::percent_decode_str;
use qualname::{NamespaceMap, NamespacePrefix, NamespaceUri, NcName, QName};
use url::Url;
use xrust::item::{Item, Node, SequenceTrait};
use xrust::output::Method;
use xrust::parser::ParseError;
use xrust::transform::Transform;
use xrust::transform::callable::{Callable, FormalParameters};
use xrust::transform::context::StaticContextBuilder;
use xrust::trees::smite::RNode;
use xrust::value::Value;
use xrust::xslt::from_document;

use super::{Backend, BackendKind};
use crate::error::{ErrorKind, Result};
use crate::functions::{DateFunction, Extensions, FUNCTION_NAMESPACE, RecordRef};

/// URL scheme answered by the date lookup.
const SCHEME: &str = "bibformat";
const PARAMETER: &str = "record";

#[derive(Debug, Clone, Copy, Default)]
pub struct InterpretedBackend;

impl Backend for InterpretedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Interpreted
    }

    fn run(&self, source: &str, template: &str, extensions: &Extensions) -> Result<String> {
        let stylesheet = parse(template).map_err(raise(ErrorKind::MalformedXml))?;
        let mut context = from_document(stylesheet, None, parse, |url: &Url| {
            Err(xrust::Error::new(xrust::ErrorKind::NotImplemented, format!("stylesheet modules are not supported: {url}")))
        })
        .map_err(raise(ErrorKind::InvalidStylesheet))?;
        for function in DateFunction::ALL {
            let (name, callable) = date_function(function)?;
            context.callable_push(name, callable);
        }

        let document = parse(source).map_err(raise(ErrorKind::MalformedXml))?;
        context.manage_whitespace(document.clone()).map_err(raise(ErrorKind::Transform))?;
        context.context(vec![Item::Node(document)], 0);
        context.result_document(RNode::new_document());

        let mut static_context = StaticContextBuilder::new()
            .message(|message: &str| {
                tracing::info!(text = message, "stylesheet message");
                Ok(())
            })
            .parser(parse)
            .fetcher(|url: &Url| fetch(url, extensions))
            .build();
        let output = context.evaluate(&mut static_context).map_err(raise(ErrorKind::Transform))?;
        let definition = context.output_definition_ref();
        Ok(match definition.method() {
            Method::Text => output.to_string(),
            _ => output.to_xml_with_options(definition),
        })
    }
}

fn raise(kind: fn(String) -> ErrorKind) -> impl FnOnce(xrust::Error) -> crate::error::Error {
    move |err| exn::Exn::from(kind(err.message))
}

fn parse(xml: &str) -> std::result::Result<RNode, xrust::Error> {
    type Resolver = fn(&NamespacePrefix) -> std::result::Result<NamespaceUri, ParseError>;
    xrust::parser::xml::parse(RNode::new_document(), xml, None::<Resolver>)
}

/// `{FUNCTION_NAMESPACE}name($record)`, returning the string value of
/// `document(concat('bibformat:name?', $record))`.
fn date_function(function: DateFunction) -> Result<(QName, Callable<RNode>)> {
    let invalid = || ErrorKind::InvalidStylesheet(format!("cannot declare {}", function.name()));
    let namespace = NamespaceUri::try_from(FUNCTION_NAMESPACE).ok().ok_or_raise(invalid)?;
    let name = NcName::try_from(function.name()).ok().ok_or_raise(invalid)?;
    let parameter = NcName::try_from(PARAMETER).ok().ok_or_raise(invalid)?;

    let url = Transform::Concat(vec![
        Transform::Literal(Item::Value(Rc::new(Value::from(format!("{SCHEME}:{}?", function.name()))))),
        Transform::VariableReference(PARAMETER.to_string(), Rc::new(NamespaceMap::new())),
    ]);
    let body = Transform::String(Box::new(Transform::Document(Box::new(url), None)));
    let callable = Callable::new(body, FormalParameters::Positional(vec![QName::from_local_name(parameter)]));
    Ok((QName::new_from_parts(name, Some(namespace)), callable))
}

/// Answers `bibformat:<function>?<argument>` with `<date>…</date>`.
fn fetch(url: &Url, extensions: &Extensions) -> std::result::Result<String, xrust::Error> {
    let function = match url.scheme() {
        SCHEME => DateFunction::ALL.into_iter().find(|function| url.path() == function.name()),
        _ => None,
    };
    let Some(function) = function else {
        return Err(xrust::Error::new(xrust::ErrorKind::DynamicAbsent, format!("resource not found: {url}")));
    };
    // Everything after the `?`, fragment included: the argument is free text.
    let argument = url.as_str().split_once('?').map_or("", |(_, argument)| argument);
    let record = RecordRef::Text(percent_decode_str(argument).decode_utf8_lossy().into_owned());
    let date = extensions.evaluate(function, &record);
    Ok(format!("<date>{}</date>", quick_xml::escape::escape(date.as_str())))
}
