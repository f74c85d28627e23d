//! Template evaluation
//!
//! Walks parsed nodes in order. Within one variable expression filters run
//! strictly one after another; the first failure stops the chain.

use std::sync::Arc;

use serde_json::Value;
use tessera_domain::{
    ErrorReason, Location, ParsedExpression, ParsedVariable, RenderError, TagInvocation,
};

use super::builtins::display_text;
use super::context::{HelperContext, RenderContext};
use super::engine::RenderEngine;
use super::environment::RenderEnvironment;
use super::extension::ExtensionError;
use super::parser::TemplateNode;
use crate::ports::PluginInfo;

/// Message of the strict-undefined failure.
pub const UNDEFINED_OUTPUT: &str = "attempted to output null or undefined value";

/// One evaluation pass over a parsed template.
pub(crate) struct Evaluation<'a> {
    environment: &'a RenderEnvironment,
    engine: &'a RenderEngine,
    context: Arc<RenderContext>,
    depth: usize,
}

impl<'a> Evaluation<'a> {
    pub(crate) const fn new(
        environment: &'a RenderEnvironment,
        engine: &'a RenderEngine,
        context: Arc<RenderContext>,
        depth: usize,
    ) -> Self {
        Self {
            environment,
            engine,
            context,
            depth,
        }
    }

    /// Rejects unparsed remainders and unknown filters, tests and tags
    /// before anything runs.
    pub(crate) fn validate(&self, nodes: &[TemplateNode]) -> Result<(), RenderError> {
        for node in nodes {
            let TemplateNode::Expression {
                expression,
                location,
            } = node
            else {
                continue;
            };
            match expression {
                ParsedExpression::Variable(variable) => self.validate_variable(variable, *location)?,
                ParsedExpression::Tag(tag) => {
                    if self.environment.tags().resolve(&tag.name).is_none() {
                        return Err(RenderError::parse(
                            format!("unknown block tag: {}", tag.name),
                            *location,
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_variable(&self, variable: &ParsedVariable, location: Location) -> Result<(), RenderError> {
        if let Some(unmatched) = self.environment.filters().unmatched(variable).first() {
            return Err(RenderError::parse(
                format!("filter not found: {}", unmatched.name),
                location,
            ));
        }
        if let Some(remainder) = &variable.remainder {
            return Err(RenderError::parse(
                format!("unable to parse filter: {remainder}"),
                location,
            ));
        }
        if let Some(test) = &variable.test {
            if self.environment.tests().resolve(&test.name).is_none() {
                return Err(RenderError::parse(format!("test not found: {}", test.name), location));
            }
        }
        Ok(())
    }

    /// Evaluates every node and concatenates the output.
    pub(crate) async fn render(&self, nodes: &[TemplateNode]) -> Result<String, RenderError> {
        let mut output = String::new();
        for node in nodes {
            match node {
                TemplateNode::Text(text) => output.push_str(text),
                TemplateNode::Expression {
                    expression: ParsedExpression::Variable(variable),
                    location,
                } => output.push_str(&self.variable(variable, *location).await?),
                TemplateNode::Expression {
                    expression: ParsedExpression::Tag(tag),
                    location,
                } => output.push_str(&self.tag(tag, *location).await?),
            }
        }
        Ok(output)
    }

    async fn variable(&self, variable: &ParsedVariable, location: Location) -> Result<String, RenderError> {
        let mut value = self
            .context
            .lookup(&variable.variable)
            .cloned()
            .unwrap_or(Value::Null);

        for application in &variable.filters {
            let Some(filter) = self.environment.filters().resolve(&application.name) else {
                return Err(RenderError::parse(
                    format!("filter not found: {}", application.name),
                    location,
                ));
            };
            let args: Vec<Value> = application
                .args
                .iter()
                .map(|arg| self.context.resolve_argument(arg))
                .collect();
            let helper = self.helper(filter.plugin().cloned());
            value = filter
                .definition
                .run
                .call(&helper, value, args)
                .await
                .map_err(|e| failure(e, location))?;
        }

        if let Some(test) = &variable.test {
            let Some(predicate) = self.environment.tests().resolve(&test.name) else {
                return Err(RenderError::parse(format!("test not found: {}", test.name), location));
            };
            let args: Vec<Value> = test
                .args
                .iter()
                .map(|arg| self.context.resolve_argument(arg))
                .collect();
            value = Value::Bool(predicate(&value, &args) != test.negated);
        }

        display_text(&value).ok_or_else(|| {
            RenderError::render(UNDEFINED_OUTPUT)
                .with_reason(ErrorReason::Undefined)
                .with_location(location)
        })
    }

    async fn tag(&self, tag: &TagInvocation, location: Location) -> Result<String, RenderError> {
        let Some(registered) = self.environment.tags().resolve(&tag.name) else {
            return Err(RenderError::parse(format!("unknown block tag: {}", tag.name), location));
        };
        let helper = self.helper(registered.plugin.clone());
        registered
            .definition
            .run
            .call(&helper, &tag.raw_args)
            .await
            .map_err(|e| failure(e, location))
    }

    fn helper(&self, plugin: Option<PluginInfo>) -> HelperContext {
        HelperContext::new(
            Arc::clone(&self.context),
            plugin,
            self.engine.clone(),
            self.depth,
        )
    }
}

fn failure(err: ExtensionError, location: Location) -> RenderError {
    RenderError::render(err.message)
        .with_reason(err.reason)
        .with_location(location)
}
