use serde_json::Value;

use crate::schema::{def, Entity, EntityDef, FieldDef, Lookup, RelationDef, RelationKind};

/// Final SQL text plus positional parameters
#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}

/// Accumulating query over one entity's table. Filters append AND-combined
/// conditions; nothing here executes SQL.
#[derive(Debug)]
pub struct Query {
    def: &'static EntityDef,
    conditions: Vec<String>,
    params: Vec<Value>,
}

impl Query {
    pub fn new(entity: Entity) -> Self {
        Self {
            def: def(entity),
            conditions: vec![],
            params: vec![],
        }
    }

    pub fn entity(&self) -> Entity {
        self.def.entity
    }

    pub fn def(&self) -> &'static EntityDef {
        self.def
    }

    /// Table name, which doubles as the correlation reference for subqueries
    pub fn table_ref(&self) -> &'static str {
        self.def.table
    }

    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Start staging conditions without touching the query. A filter that can
    /// fail mid-way builds everything into the stage and commits only on
    /// success, so a failed filter leaves the query unmodified.
    pub fn stage(&self) -> Staged {
        Staged {
            base_index: self.params.len(),
            conditions: vec![],
            params: vec![],
        }
    }

    pub fn commit(&mut self, staged: Staged) {
        debug_assert_eq!(staged.base_index, self.params.len());
        self.conditions.extend(staged.conditions);
        self.params.extend(staged.params);
    }

    pub fn to_sql(&self) -> SqlResult {
        let where_clause = self.where_clause();
        let query = if where_clause.is_empty() {
            format!("SELECT * FROM \"{}\"", self.def.table)
        } else {
            format!("SELECT * FROM \"{}\" WHERE {}", self.def.table, where_clause)
        };
        SqlResult { query, params: self.params.clone() }
    }

    pub fn to_count_sql(&self) -> SqlResult {
        let where_clause = self.where_clause();
        let query = if where_clause.is_empty() {
            format!("SELECT COUNT(*) as count FROM \"{}\"", self.def.table)
        } else {
            format!("SELECT COUNT(*) as count FROM \"{}\" WHERE {}", self.def.table, where_clause)
        };
        SqlResult { query, params: self.params.clone() }
    }

    fn where_clause(&self) -> String {
        self.conditions.join(" AND ")
    }
}

/// Conditions and params staged on top of an existing query
#[derive(Debug)]
pub struct Staged {
    base_index: usize,
    pub conditions: Vec<String>,
    pub params: Vec<Value>,
}

impl Staged {
    pub fn param(&mut self, value: Value) -> String {
        self.params.push(value);
        format!("${}", self.base_index + self.params.len())
    }
}

/// Wrap a terminal condition in correlated EXISTS subqueries, one per
/// relation hop. `owner_ref` is the table name or alias the current hop
/// correlates against; the terminal closure receives the innermost alias.
pub(crate) fn exists_chain(
    owner_ref: &str,
    hops: &[&'static RelationDef],
    depth: usize,
    terminal: &mut dyn FnMut(&str) -> String,
) -> String {
    let Some((relation, rest)) = hops.split_first() else {
        return terminal(owner_ref);
    };

    let target = def(relation.target);
    let alias = format!("t{}", depth);

    match &relation.kind {
        RelationKind::ForeignKey { column, target_pk } => {
            let inner = exists_chain(&alias, rest, depth + 1, terminal);
            format!(
                "EXISTS (SELECT 1 FROM \"{}\" \"{}\" WHERE \"{}\".\"{}\" = \"{}\".\"{}\" AND {})",
                target.table, alias, alias, target_pk, owner_ref, column, inner
            )
        }
        RelationKind::Reverse { target_fk, local_pk } => {
            let inner = exists_chain(&alias, rest, depth + 1, terminal);
            format!(
                "EXISTS (SELECT 1 FROM \"{}\" \"{}\" WHERE \"{}\".\"{}\" = \"{}\".\"{}\" AND {})",
                target.table, alias, alias, target_fk, owner_ref, local_pk, inner
            )
        }
        RelationKind::ManyToMany { join_table, left_col, right_col, local_pk, target_pk } => {
            let join_alias = format!("j{}", depth);
            let inner = exists_chain(&alias, rest, depth + 1, terminal);
            format!(
                "EXISTS (SELECT 1 FROM \"{}\" \"{}\" JOIN \"{}\" \"{}\" ON \"{}\".\"{}\" = \"{}\".\"{}\" WHERE \"{}\".\"{}\" = \"{}\".\"{}\" AND {})",
                join_table, join_alias,
                target.table, alias,
                alias, target_pk, join_alias, right_col,
                join_alias, left_col, owner_ref, local_pk,
                inner
            )
        }
    }
}

/// Escape LIKE wildcards in a user-supplied value (backslash is the default
/// escape character in Postgres)
pub(crate) fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Text comparison against an SQL expression. Pattern lookups carry their
/// wildcards inside the bound parameter.
pub(crate) fn text_condition(expr: &str, lookup: Lookup, value: &str, staged: &mut Staged) -> String {
    match lookup {
        Lookup::Exact => format!("{} = {}", expr, staged.param(Value::String(value.to_string()))),
        Lookup::Iexact => {
            format!("LOWER({}) = LOWER({})", expr, staged.param(Value::String(value.to_string())))
        }
        Lookup::Contains => {
            format!("{} LIKE {}", expr, staged.param(Value::String(format!("%{}%", escape_like(value)))))
        }
        Lookup::Icontains => {
            format!("{} ILIKE {}", expr, staged.param(Value::String(format!("%{}%", escape_like(value)))))
        }
        Lookup::Startswith => {
            format!("{} LIKE {}", expr, staged.param(Value::String(format!("{}%", escape_like(value)))))
        }
        Lookup::Istartswith => {
            format!("{} ILIKE {}", expr, staged.param(Value::String(format!("{}%", escape_like(value)))))
        }
        // Degenerate single-value membership
        Lookup::In => format!("{} IN ({})", expr, staged.param(Value::String(value.to_string()))),
        Lookup::Lt => format!("{} < {}", expr, staged.param(Value::String(value.to_string()))),
        Lookup::Lte => format!("{} <= {}", expr, staged.param(Value::String(value.to_string()))),
        Lookup::Gt => format!("{} > {}", expr, staged.param(Value::String(value.to_string()))),
        Lookup::Gte => format!("{} >= {}", expr, staged.param(Value::String(value.to_string()))),
    }
}

/// Qualified column expression for a terminal field
pub(crate) fn column_expr(owner_ref: &str, field: &FieldDef) -> String {
    format!("\"{}\".\"{}\"", owner_ref, field.column)
}
