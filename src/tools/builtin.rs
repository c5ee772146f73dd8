//! The built-in tools: `search`, `summarize` and `vector_search`.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::adapters::{AdapterError, Generator, RecordQuery, RecordSource};
use crate::dispatcher::{RegistryError, ToolContext, ToolRegistry};
use crate::retrieval::{Query, RetrievalPipeline};
use crate::tools::{
    ArgSchema, Arguments, ParamSpec, ParamType, ToolArgs, ToolDescriptor, ToolError, ToolHandler,
};

pub const SEARCH_TOOL: &str = "search";
pub const SUMMARIZE_TOOL: &str = "summarize";
pub const VECTOR_SEARCH_TOOL: &str = "vector_search";

pub const DEFAULT_TOP_K: i64 = 5;

/// How much detail a summary should keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryStyle {
    Brief,
    Detailed,
}

impl SummaryStyle {
    pub fn from_abridged(abridged: bool) -> Self {
        if abridged {
            SummaryStyle::Brief
        } else {
            SummaryStyle::Detailed
        }
    }

    /// System instruction sent to the generation provider.
    pub fn instruction(&self) -> &'static str {
        match self {
            SummaryStyle::Brief => "Summarize the following school data in 2-3 sentences.",
            SummaryStyle::Detailed => "Summarize the following school data in detail.",
        }
    }
}

/// Serialize a record payload for the model.
///
/// Compact JSON with object keys in sorted order at every level, so the same
/// records always produce the same text.
pub fn serialize_records(records: &Value) -> String {
    canonicalize(records).to_string()
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonicalize(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// `search(area, city) -> record list`
pub struct SearchTool {
    records: Arc<dyn RecordSource>,
}

impl SearchTool {
    pub fn new(records: Arc<dyn RecordSource>) -> Self {
        Self { records }
    }

    pub fn descriptor(records: Arc<dyn RecordSource>) -> ToolDescriptor {
        ToolDescriptor::new(
            SEARCH_TOOL,
            "Fetch the school list for an area from the record source",
            area_city_schema(),
            Arc::new(Self::new(records)),
        )
    }
}

#[async_trait]
impl ToolHandler for SearchTool {
    async fn call(&self, _ctx: &ToolContext<'_>, args: ToolArgs) -> Result<Value, ToolError> {
        let query = RecordQuery::new(args.get_str("area")?, args.get_str("city")?);

        let records = self
            .records
            .fetch(&query)
            .await
            .map_err(ToolError::Upstream)?;

        if !records.is_array() {
            return Err(ToolError::Upstream(AdapterError::Malformed(
                "expected a JSON list of records".into(),
            )));
        }

        Ok(records)
    }
}

/// `summarize(area, city, abridged = true) -> text`
///
/// Sub-invokes `search` and condenses its records with the generation provider.
pub struct SummarizeTool {
    generator: Arc<dyn Generator>,
}

impl SummarizeTool {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    pub fn descriptor(generator: Arc<dyn Generator>) -> ToolDescriptor {
        ToolDescriptor::new(
            SUMMARIZE_TOOL,
            "Convert raw school data for an area into user-friendly text",
            area_city_schema().param(
                ParamSpec::new("abridged", ParamType::Boolean)
                    .default_value(json!(true))
                    .description("Two or three sentences instead of a detailed summary"),
            ),
            Arc::new(Self::new(generator)),
        )
    }
}

#[async_trait]
impl ToolHandler for SummarizeTool {
    async fn call(&self, ctx: &ToolContext<'_>, args: ToolArgs) -> Result<Value, ToolError> {
        let style = SummaryStyle::from_abridged(args.get_bool("abridged")?);

        let search_args: Arguments = [
            ("area".to_string(), json!(args.get_str("area")?)),
            ("city".to_string(), json!(args.get_str("city")?)),
        ]
        .into_iter()
        .collect();

        let records = ctx.invoke(SEARCH_TOOL, search_args).await.into_result()?;

        let summary = self
            .generator
            .generate(Some(style.instruction()), &serialize_records(&records))
            .await
            .map_err(ToolError::Provider)?;

        Ok(Value::String(summary))
    }
}

/// `vector_search(query, top_k = 5) -> hit list`
pub struct VectorSearchTool {
    pipeline: Arc<RetrievalPipeline>,
}

impl VectorSearchTool {
    pub fn new(pipeline: Arc<RetrievalPipeline>) -> Self {
        Self { pipeline }
    }

    pub fn descriptor(pipeline: Arc<RetrievalPipeline>) -> ToolDescriptor {
        ToolDescriptor::new(
            VECTOR_SEARCH_TOOL,
            "Embed the query and fetch the nearest stored records",
            ArgSchema::new()
                .param(
                    ParamSpec::new("query", ParamType::String)
                        .required()
                        .description("Free-text query"),
                )
                .param(
                    ParamSpec::new("top_k", ParamType::Integer)
                        .default_value(json!(DEFAULT_TOP_K))
                        .minimum(1)
                        .description("Number of hits to return"),
                ),
            Arc::new(Self::new(pipeline)),
        )
    }
}

#[async_trait]
impl ToolHandler for VectorSearchTool {
    async fn call(&self, _ctx: &ToolContext<'_>, args: ToolArgs) -> Result<Value, ToolError> {
        let top_k = usize::try_from(args.get_i64("top_k")?)
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or_else(|| ToolError::invalid_argument("top_k", "must be at least 1"))?;

        let query = Query::new(args.get_str("query")?, top_k);
        let hits = self.pipeline.retrieve(&query).await?;

        Ok(json!(hits))
    }
}

fn area_city_schema() -> ArgSchema {
    ArgSchema::new()
        .param(
            ParamSpec::new("area", ParamType::String)
                .required()
                .description("Area or neighborhood"),
        )
        .param(
            ParamSpec::new("city", ParamType::String)
                .required()
                .description("City name"),
        )
}

/// Services the built-in tools are wired to.
#[derive(Clone)]
pub struct BuiltinServices {
    pub records: Arc<dyn RecordSource>,
    pub generator: Arc<dyn Generator>,
    pub pipeline: Arc<RetrievalPipeline>,
}

/// Register `search`, `summarize` and `vector_search`.
pub fn register_builtin_tools(
    registry: &mut ToolRegistry,
    services: BuiltinServices,
) -> Result<(), RegistryError> {
    registry.register(SearchTool::descriptor(services.records))?;
    registry.register(SummarizeTool::descriptor(services.generator))?;
    registry.register(VectorSearchTool::descriptor(services.pipeline))?;
    Ok(())
}
