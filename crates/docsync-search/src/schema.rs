//! Tantivy schema for document indexes.
//!
//! Every index carries three bookkeeping columns:
//! - doc_id: STRING | STORED, the document id
//! - doc_key: u64 INDEXED | FAST, numeric doc-id order and paging cursor
//! - all_text: TEXT, every text value, answers keywords
//!
//! plus one column per document field, shaped by its [`IndexKind`]. Raw text
//! fields get a companion `{name}__rank` FAST string column holding the
//! ascii-rank (transliterated text) used for sorting.

use std::collections::BTreeMap;

use tantivy::schema::{
    DateOptions, Field, FieldType, IndexRecordOption, Schema, TextFieldIndexing, TextOptions,
    FAST, INDEXED, STORED, STRING, TEXT,
};

use crate::document::{ALL_TEXT_FIELD, DOC_ID_FIELD, DOC_KEY_FIELD};
use crate::error::SearchError;
use crate::field::IndexKind;

/// Tokenizer registered for token-text fields: whitespace split + lowercase.
pub const TOKENS_TOKENIZER: &str = "tokens";

const RANK_SUFFIX: &str = "__rank";

/// Name of the sort column for a raw text field.
pub fn rank_field_name(name: &str) -> String {
    format!("{}{}", name, RANK_SUFFIX)
}

/// Handles for one document field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaField {
    pub kind: IndexKind,
    pub field: Field,
    /// Ascii-rank column (raw text only)
    pub rank: Option<Field>,
}

/// Schema field handles for efficient access
#[derive(Debug, Clone)]
pub struct IndexSchema {
    schema: Schema,
    pub doc_id: Field,
    pub doc_key: Field,
    pub all_text: Field,
    fields: BTreeMap<String, SchemaField>,
}

impl IndexSchema {
    /// Get the underlying Tantivy schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &SchemaField)> {
        self.fields.iter()
    }

    /// Recover field handles and kinds from an existing Tantivy schema.
    pub fn from_schema(schema: Schema) -> Result<Self, SearchError> {
        let doc_id = schema
            .get_field(DOC_ID_FIELD)
            .map_err(|_| SearchError::SchemaMismatch("missing doc_id field".into()))?;
        let doc_key = schema
            .get_field(DOC_KEY_FIELD)
            .map_err(|_| SearchError::SchemaMismatch("missing doc_key field".into()))?;
        let all_text = schema
            .get_field(ALL_TEXT_FIELD)
            .map_err(|_| SearchError::SchemaMismatch("missing all_text field".into()))?;

        let mut fields = BTreeMap::new();
        for (field, entry) in schema.fields() {
            let name = entry.name();
            if name == DOC_ID_FIELD
                || name == DOC_KEY_FIELD
                || name == ALL_TEXT_FIELD
                || name.ends_with(RANK_SUFFIX)
            {
                continue;
            }

            let kind = match entry.field_type() {
                FieldType::Str(options) => {
                    let tokenizer = options
                        .get_indexing_options()
                        .map(|indexing| indexing.tokenizer())
                        .unwrap_or("raw");
                    if tokenizer == TOKENS_TOKENIZER {
                        IndexKind::TokenText
                    } else {
                        IndexKind::RawText
                    }
                }
                FieldType::I64(_) => IndexKind::I64,
                FieldType::F64(_) => IndexKind::F64,
                FieldType::Date(_) => IndexKind::Date,
                other => {
                    return Err(SearchError::SchemaMismatch(format!(
                        "field {} has unsupported type {:?}",
                        name,
                        other.value_type()
                    )))
                }
            };

            let rank = match kind {
                IndexKind::RawText => Some(rank_column(&schema, name)?),
                _ => None,
            };

            fields.insert(name.to_string(), SchemaField { kind, field, rank });
        }

        Ok(Self {
            schema,
            doc_id,
            doc_key,
            all_text,
            fields,
        })
    }

    /// Check that every expected field exists with the expected kind.
    pub fn check_compatible(&self, expected: &[(String, IndexKind)]) -> Result<(), SearchError> {
        for (name, kind) in expected {
            match self.fields.get(name) {
                Some(existing) if existing.kind == *kind => {}
                Some(existing) => {
                    return Err(SearchError::SchemaMismatch(format!(
                        "field {} is {:?} in the index but {:?} in the schema",
                        name, existing.kind, kind
                    )))
                }
                None => {
                    return Err(SearchError::SchemaMismatch(format!(
                        "field {} missing from the index",
                        name
                    )))
                }
            }
        }
        Ok(())
    }
}

fn rank_column(schema: &Schema, name: &str) -> Result<Field, SearchError> {
    let rank = schema
        .get_field(&rank_field_name(name))
        .map_err(|_| SearchError::SchemaMismatch(format!("missing rank column for {}", name)))?;
    match schema.get_field_entry(rank).field_type() {
        FieldType::Str(options) if options.is_fast() => Ok(rank),
        _ => Err(SearchError::SchemaMismatch(format!(
            "rank column for {} is not a fast text column",
            name
        ))),
    }
}

/// Build the Tantivy schema for a set of document fields.
pub fn build_index_schema(fields: &[(String, IndexKind)]) -> IndexSchema {
    let mut schema_builder = Schema::builder();

    let doc_id = schema_builder.add_text_field(DOC_ID_FIELD, STRING | STORED);
    let doc_key = schema_builder.add_u64_field(DOC_KEY_FIELD, INDEXED | FAST);
    let all_text = schema_builder.add_text_field(ALL_TEXT_FIELD, TEXT);

    let token_options = TextOptions::default()
        .set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(TOKENS_TOKENIZER)
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        )
        .set_stored();

    let rank_options = TextOptions::default().set_fast(Some("raw"));

    let date_options = DateOptions::default().set_indexed().set_stored().set_fast();

    let mut handles = BTreeMap::new();
    for (name, kind) in fields {
        let (field, rank) = match kind {
            IndexKind::RawText => {
                let field = schema_builder.add_text_field(name, STRING | STORED);
                let rank = schema_builder.add_text_field(&rank_field_name(name), rank_options.clone());
                (field, Some(rank))
            }
            IndexKind::TokenText => (
                schema_builder.add_text_field(name, token_options.clone()),
                None,
            ),
            IndexKind::I64 => (schema_builder.add_i64_field(name, INDEXED | STORED | FAST), None),
            IndexKind::F64 => (schema_builder.add_f64_field(name, INDEXED | STORED | FAST), None),
            IndexKind::Date => (schema_builder.add_date_field(name, date_options.clone()), None),
        };
        handles.insert(
            name.clone(),
            SchemaField {
                kind: *kind,
                field,
                rank,
            },
        );
    }

    IndexSchema {
        schema: schema_builder.build(),
        doc_id,
        doc_key,
        all_text,
        fields: handles,
    }
}
