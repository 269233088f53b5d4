/*!
 * Element type catalog
 *
 * Selection groups map a command-line option to the `Type` identifiers of
 * the schema objects it removes. The manifest field table maps the children
 * of `ObjectCounts` in origin.xml back to those identifiers.
 */

use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};

use crate::error::{EditorError, Result};

/// Name of the umbrella group that covers every other group
pub const ALL_OBJECTS_GROUP: &str = "--AllObjects";

/// A named, fixed set of type identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeGroup {
    pub name: &'static str,
    pub description: &'static str,
    pub types: &'static [&'static str],
}

const GROUPS: &[TypeGroup] = &[
    TypeGroup {
        name: "--Views",
        description: "Remove all views",
        types: &["SqlView"],
    },
    TypeGroup {
        name: "--StoredProcedures",
        description: "Remove all stored procedures",
        types: &["SqlProcedure"],
    },
    TypeGroup {
        name: "--Functions",
        description: "Remove all functions",
        types: &[
            "SqlFunction",
            "SqlInlineTableValuedFunction",
            "SqlMultiStatementTableValuedFunction",
            "SqlScalarFunction",
        ],
    },
    TypeGroup {
        name: "--Tables",
        description: "Remove all tables",
        types: &["SqlTable"],
    },
    TypeGroup {
        name: "--Indexes",
        description: "Remove all indexes",
        types: &["SqlIndex", "SqlIndexClustered", "SqlIndexNonClustered"],
    },
    TypeGroup {
        name: "--Constraints",
        description: "Remove all constraints",
        types: &[
            "SqlCheckConstraint",
            "SqlDefaultConstraint",
            "SqlForeignKeyConstraint",
            "SqlPrimaryKeyConstraint",
            "SqlUniqueConstraint",
        ],
    },
    TypeGroup {
        name: "--Triggers",
        description: "Remove all triggers",
        types: &["SqlDmlTrigger"],
    },
    TypeGroup {
        name: "--Schemas",
        description: "Remove all schemas",
        types: &["SqlSchema"],
    },
    TypeGroup {
        name: "--Users",
        description: "Remove all users",
        types: &["SqlUser"],
    },
    TypeGroup {
        name: "--Roles",
        description: "Remove all roles",
        types: &["SqlRole"],
    },
    TypeGroup {
        name: ALL_OBJECTS_GROUP,
        description: "Remove all database objects",
        types: &[
            "SqlView",
            "SqlProcedure",
            "SqlFunction",
            "SqlInlineTableValuedFunction",
            "SqlMultiStatementTableValuedFunction",
            "SqlScalarFunction",
            "SqlTable",
            "SqlIndex",
            "SqlIndexClustered",
            "SqlIndexNonClustered",
            "SqlCheckConstraint",
            "SqlDefaultConstraint",
            "SqlForeignKeyConstraint",
            "SqlPrimaryKeyConstraint",
            "SqlUniqueConstraint",
            "SqlDmlTrigger",
            "SqlSchema",
            "SqlUser",
            "SqlRole",
        ],
    },
];

// ObjectCounts child name -> model Type attribute.
// TableValuedFunction only covers the inline variant.
const MANIFEST_FIELDS: &[(&str, &str)] = &[
    ("View", "SqlView"),
    ("Procedure", "SqlProcedure"),
    ("ScalarFunction", "SqlScalarFunction"),
    ("TableValuedFunction", "SqlInlineTableValuedFunction"),
    ("Table", "SqlTable"),
    ("Index", "SqlIndex"),
    ("DefaultConstraint", "SqlDefaultConstraint"),
    ("CheckConstraint", "SqlCheckConstraint"),
    ("ForeignKeyConstraint", "SqlForeignKeyConstraint"),
    ("PrimaryKeyConstraint", "SqlPrimaryKeyConstraint"),
    ("UniqueConstraint", "SqlUniqueConstraint"),
    ("DmlTrigger", "SqlDmlTrigger"),
    ("Schema", "SqlSchema"),
    ("User", "SqlUser"),
    ("Role", "SqlRole"),
    ("ComputedColumn", "SqlComputedColumn"),
    ("SimpleColumn", "SqlSimpleColumn"),
    ("SubroutineParameter", "SqlSubroutineParameter"),
    ("DatabaseOptions", "SqlDatabaseOptions"),
    ("DatabaseCredential", "SqlDatabaseCredential"),
    ("MasterKey", "SqlMasterKey"),
    ("PermissionStatement", "SqlPermissionStatement"),
    ("RoleMembership", "SqlRoleMembership"),
    ("ScriptFunctionImplementation", "SqlScriptFunctionImplementation"),
];

static BUILTIN: Lazy<ElementTypeCatalog> = Lazy::new(ElementTypeCatalog::builtin);

/// Process-wide catalog, built on first use
pub fn catalog() -> &'static ElementTypeCatalog {
    &BUILTIN
}

/// Read-only lookup tables for selection groups and manifest fields
#[derive(Debug)]
pub struct ElementTypeCatalog {
    groups: &'static [TypeGroup],
    field_types: HashMap<&'static str, &'static str>,
}

impl ElementTypeCatalog {
    fn builtin() -> Self {
        Self {
            groups: GROUPS,
            field_types: MANIFEST_FIELDS.iter().copied().collect(),
        }
    }

    /// All groups in usage order
    pub fn groups(&self) -> &[TypeGroup] {
        self.groups
    }

    /// Look up a group by its exact (case-sensitive) name
    pub fn group(&self, name: &str) -> Option<&TypeGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Type identifier bound to an `ObjectCounts` field, if any
    pub fn type_for_manifest_field(&self, field: &str) -> Option<&'static str> {
        self.field_types.get(field).copied()
    }

    /// Every type identifier named by any group
    pub fn all_type_ids(&self) -> BTreeSet<&'static str> {
        self.groups
            .iter()
            .flat_map(|g| g.types.iter().copied())
            .collect()
    }

    /// Resolve selection options into the combined set of type identifiers
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<TypeSelection> {
        if names.is_empty() {
            return Err(EditorError::Usage(
                "at least one selection option is required".to_string(),
            ));
        }

        let mut selection = TypeSelection::default();
        for name in names {
            let name = name.as_ref();
            let group = self
                .group(name)
                .ok_or_else(|| EditorError::UnknownSelection(name.to_string()))?;
            if !selection.groups.iter().any(|g| g == group.name) {
                selection.groups.push(group.name.to_string());
            }
            for type_id in group.types {
                selection.insert(type_id);
            }
        }
        Ok(selection)
    }
}

/// Type identifiers targeted by one run, de-duplicated in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeSelection {
    groups: Vec<String>,
    types: Vec<String>,
}

impl TypeSelection {
    /// Build a selection directly from type identifiers
    pub fn from_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selection = Self::default();
        for type_id in types {
            selection.insert(type_id.as_ref());
        }
        selection
    }

    fn insert(&mut self, type_id: &str) {
        if !self.contains(type_id) {
            self.types.push(type_id.to_string());
        }
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.types.iter().any(|t| t == type_id)
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }

    /// Group names the selection was resolved from
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
