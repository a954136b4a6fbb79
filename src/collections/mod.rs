//! Declarative collection definitions.
//!
//! A collection is a named table plus field declarations and the five access
//! rules (list/view/create/update/delete). Rules are filter expressions kept
//! verbatim; `None` means superusers only, `Some("")` means public.

pub mod definitions;

use serde::{Deserialize, Serialize};

pub use definitions::{habits, instruments, users, USERS_COLLECTION_ID};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Base,
    Auth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Text {
        min: Option<u32>,
        max: Option<u32>,
    },
    Select {
        values: Vec<String>,
    },
    Number,
    Relation {
        collection_id: String,
        cascade_delete: bool,
        max_select: Option<u32>,
    },
    Json {
        max_size: Option<u64>,
    },
    Bool,
    Autodate {
        on_create: bool,
        on_update: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub required: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl Field {
    fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            required: false,
            kind,
        }
    }

    pub fn text(name: &str, min: Option<u32>, max: Option<u32>) -> Self {
        Self::new(name, FieldKind::Text { min, max })
    }

    pub fn select(name: &str, values: &[&str]) -> Self {
        Self::new(
            name,
            FieldKind::Select {
                values: values.iter().map(|v| v.to_string()).collect(),
            },
        )
    }

    pub fn number(name: &str) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn relation(name: &str, collection_id: &str, cascade_delete: bool) -> Self {
        Self::new(
            name,
            FieldKind::Relation {
                collection_id: collection_id.to_string(),
                cascade_delete,
                max_select: None,
            },
        )
    }

    pub fn json(name: &str, max_size: Option<u64>) -> Self {
        Self::new(name, FieldKind::Json { max_size })
    }

    pub fn boolean(name: &str) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    pub fn autodate(name: &str, on_create: bool, on_update: bool) -> Self {
        Self::new(name, FieldKind::Autodate { on_create, on_update })
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Limit a relation field to `n` linked records
    pub fn max_select(mut self, n: u32) -> Self {
        if let FieldKind::Relation { max_select, .. } = &mut self.kind {
            *max_select = Some(n);
        }
        self
    }

    /// Relations holding more than one record are stored as JSON arrays
    pub fn is_multiple(&self) -> bool {
        matches!(self.kind, FieldKind::Relation { max_select: Some(n), .. } if n > 1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rules {
    pub list: Option<String>,
    pub view: Option<String>,
    pub create: Option<String>,
    pub update: Option<String>,
    pub delete: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub kind: CollectionKind,
    pub fields: Vec<Field>,
    pub rules: Rules,
}

impl Collection {
    /// Base collection whose id equals its name
    pub fn base(name: &str) -> Self {
        Self {
            id: name.to_string(),
            name: name.to_string(),
            kind: CollectionKind::Base,
            fields: Vec::new(),
            rules: Rules::default(),
        }
    }

    pub fn auth(name: &str) -> Self {
        Self {
            kind: CollectionKind::Auth,
            ..Self::base(name)
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_rules(mut self, rules: Rules) -> Self {
        self.rules = rules;
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Ids of the collections this one links to
    pub fn relation_targets(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter_map(|f| match &f.kind {
                FieldKind::Relation { collection_id, .. } => Some(collection_id.as_str()),
                _ => None,
            })
            .collect()
    }
}
