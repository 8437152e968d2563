use rusqlite::types::Value;

use runcrew_types::api::CrewFilter;

/// A WHERE fragment with its positional parameters, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub sql: String,
    pub params: Vec<Value>,
}

impl WhereClause {
    fn push(&mut self, condition: &str, value: Value) {
        self.sql.push_str(if self.params.is_empty() { " WHERE " } else { " AND " });
        self.params.push(value);
        self.sql.push_str(&condition.replace('?', &format!("?{}", self.params.len())));
    }
}

/// Build the WHERE clause for a crew search. Only filters that are set
/// contribute a condition; an empty filter yields an empty clause.
pub fn build_where(filter: &CrewFilter) -> WhereClause {
    let mut clause = WhereClause {
        sql: String::new(),
        params: Vec::new(),
    };

    if let Some(region) = filter.activity_region {
        clause.push("activity_region = ?", Value::Text(region.as_str().to_string()));
    }
    // The caller's age range must fit inside the crew's accepted range.
    if let Some(min_age) = filter.min_age {
        clause.push("min_age <= ?", Value::Integer(min_age.into()));
    }
    if let Some(max_age) = filter.max_age {
        clause.push("max_age >= ?", Value::Integer(max_age.into()));
    }
    if let Some(gender) = filter.gender {
        clause.push("gender = ?", Value::Text(gender.as_str().to_string()));
    }
    if let Some(open) = filter.run_record_public {
        clause.push("run_record_open = ?", Value::Integer(open.into()));
    }
    if let Some(required) = filter.leader_required {
        clause.push("leader_required = ?", Value::Integer(required.into()));
    }

    clause
}
